use std::borrow::Cow;
use std::fmt;

/// Name of the logical channel an item was emitted on.
///
/// Adapters emit on [`EventName::DATA`] unless configured otherwise, e.g.
/// stderr frames on `"stderr"` or pull progress on `"progress"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventName(Cow<'static, str>);

impl EventName {
    /// The primary item channel.
    pub const DATA: EventName = EventName(Cow::Borrowed("data"));

    /// Create an event name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the primary item channel.
    pub fn is_data(&self) -> bool {
        self.0 == "data"
    }
}

impl Default for EventName {
    fn default() -> Self {
        Self::DATA
    }
}

impl From<&'static str> for EventName {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One item emitted by a logical stream, labeled with its event name.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<T> {
    pub name: EventName,
    pub item: T,
}

impl<T> Event<T> {
    pub fn new(name: EventName, item: T) -> Self {
        Self { name, item }
    }

    /// An item on the primary channel.
    pub fn data(item: T) -> Self {
        Self::new(EventName::DATA, item)
    }

    pub fn is(&self, name: &EventName) -> bool {
        &self.name == name
    }

    pub fn into_item(self) -> T {
        self.item
    }
}
