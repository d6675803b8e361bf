//! Service outcome
//!
//! A successful service call may carry a confirmation for the user, shown as
//! a flash message on the next page.

#[derive(Debug)]
pub struct ServiceOutcome<T> {
    result: T,
    message: Option<String>,
}

impl<T> ServiceOutcome<T> {
    pub fn success(result: T) -> Self {
        Self {
            result,
            message: None,
        }
    }

    pub fn success_with_message(result: T, message: impl Into<String>) -> Self {
        Self {
            result,
            message: Some(message.into()),
        }
    }

    pub fn result(&self) -> &T {
        &self.result
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn into_result(self) -> T {
        self.result
    }

    pub fn into_parts(self) -> (T, Option<String>) {
        (self.result, self.message)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceOutcome<U> {
        ServiceOutcome {
            result: f(self.result),
            message: self.message,
        }
    }
}
