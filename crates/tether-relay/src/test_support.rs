use crate::event::Event;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TestEvent {
    Ping(u32),
    Pong,
    Notify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TestTag {
    Ping,
    Pong,
    Notify,
}

impl Event for TestEvent {
    type Tag = TestTag;

    fn tag(&self) -> TestTag {
        match self {
            TestEvent::Ping(_) => TestTag::Ping,
            TestEvent::Pong => TestTag::Pong,
            TestEvent::Notify => TestTag::Notify,
        }
    }
}
