pub mod notification;
pub mod presenter;

pub use notification::{LocalNotification, LogNotifier, NotificationData, Notifier, TravelMode};
pub use presenter::{AlarmModal, AlarmPresenter};
