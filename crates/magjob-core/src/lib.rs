pub mod calendar;
pub mod chat;
pub mod clock;
pub mod expansion;
pub mod notification;
pub mod page;
pub mod shift;

pub use calendar::{
    parse_weekday, validate_number_of_days, weekday_name, AvailabilityTemplate, CalendarError,
    Graphic, TimeEntry, TimeEntryMember, TimeEntryTemplate,
};
pub use chat::{chat_topic, Chat, ChatEvent, ChatMember, ChatMessage, DEFAULT_OWNER_NICKNAME};
pub use clock::{Clock, FixedClock, SystemClock};
pub use expansion::{expand, expand_into_entries, ExpansionError, TimeSlot};
pub use notification::{Notification, NotificationFilter, NotificationTarget, TargetError};
pub use page::{Page, PageError, PageRequest, Sort, SortDirection, SortKey, Sortable};
pub use shift::{
    EditRequestStatus, NewShift, NewShiftEditRequest, Shift, ShiftEditRequest, ShiftError,
    StatusParseError,
};
