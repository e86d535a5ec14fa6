//! Business operations, one service per resource.

pub mod availability;
pub mod chat;
pub mod graphic;
pub mod notification;
pub mod shift;
pub mod time_entry;

use magjob_core::Clock;
use std::sync::Arc;

pub use availability::AvailabilityTemplateService;
pub use chat::{ChatMemberService, ChatMessageService, ChatService};
pub use graphic::GraphicService;
pub use notification::NotificationService;
pub use shift::{ShiftEditRequestService, ShiftService};
pub use time_entry::{TimeEntryMemberService, TimeEntryService};

use crate::db::Repositories;
use crate::realtime::Hub;

#[derive(Clone)]
pub struct Services {
    pub availability_templates: AvailabilityTemplateService,
    pub graphics: GraphicService,
    pub time_entries: TimeEntryService,
    pub time_entry_members: TimeEntryMemberService,
    pub shifts: ShiftService,
    pub shift_edit_requests: ShiftEditRequestService,
    pub chats: ChatService,
    pub chat_members: ChatMemberService,
    pub chat_messages: ChatMessageService,
    pub notifications: NotificationService,
}

impl Services {
    pub fn new(repos: Repositories, hub: Arc<Hub>, clock: Arc<dyn Clock>) -> Self {
        Self {
            availability_templates: AvailabilityTemplateService::new(repos.calendar.clone()),
            graphics: GraphicService::new(repos.calendar.clone()),
            time_entries: TimeEntryService::new(repos.calendar.clone()),
            time_entry_members: TimeEntryMemberService::new(repos.calendar),
            shifts: ShiftService::new(repos.shifts.clone(), clock.clone()),
            shift_edit_requests: ShiftEditRequestService::new(repos.shifts),
            chats: ChatService::new(repos.chats.clone(), clock.clone()),
            chat_members: ChatMemberService::new(repos.chats.clone(), hub.clone()),
            chat_messages: ChatMessageService::new(repos.chats, hub.clone(), clock.clone()),
            notifications: NotificationService::new(repos.notifications, hub, clock),
        }
    }
}
