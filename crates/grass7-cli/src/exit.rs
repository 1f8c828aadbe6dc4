use std::process::ExitCode;

/// Outcome of a command: an exit code plus an optional final message,
/// printed to stdout on success and stderr on failure.
#[derive(Debug)]
pub struct Exit {
    code: u8,
    message: Option<String>,
}

impl Exit {
    pub fn success() -> Self {
        Self {
            code: 0,
            message: None,
        }
    }

    pub fn error() -> Self {
        Self {
            code: 1,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn process(self) -> ExitCode {
        if let Some(message) = self.message {
            if self.code == 0 {
                println!("{message}");
            } else {
                eprintln!("{message}");
            }
        }
        ExitCode::from(self.code)
    }
}
