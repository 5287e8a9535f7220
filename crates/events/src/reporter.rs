use std::sync::Arc;

use vernal_errors::{Error, UserFacingError};

use crate::{AppEvent, EventEmitter, EventSender, GeneralEvent};

/// Sink for failures that must reach the user.
///
/// Background components (installer pipeline, service watchdog) never
/// return their failures to a caller; they hand them to a reporter once.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &Error);
}

impl ErrorReporter for EventSender {
    fn report(&self, error: &Error) {
        tracing::debug!(code = ?error.user_code(), %error, "reporting error");
        self.emit(AppEvent::General(GeneralEvent::Error {
            message: error.user_message().into_owned(),
            details: error.user_detail().map(std::borrow::Cow::into_owned),
        }));
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for Arc<T> {
    fn report(&self, error: &Error) {
        (**self).report(error);
    }
}
