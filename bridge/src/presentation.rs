/// How a notification should present when it is about to display.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Presentation {
    pub banner: bool,
    pub sound: bool,
}

impl Presentation {
    pub fn is_suppressed(self) -> bool {
        !self.banner && !self.sound
    }
}

/// A user already looking at the conversation is not interrupted:
/// suppress when the shell window holds focus and the application is
/// frontmost, otherwise present with banner and sound.
pub fn presentation_for(focused: bool, frontmost: bool) -> Presentation {
    if focused && frontmost {
        Presentation {
            banner: false,
            sound: false,
        }
    } else {
        Presentation {
            banner: true,
            sound: true,
        }
    }
}
