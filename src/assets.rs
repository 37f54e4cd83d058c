use crate::family::Gender;
use serde::{Deserialize, Serialize};

/// Supplies the avatar image for a member. The returned string is used as an
/// SVG `href` verbatim; decoding is left to whatever displays the output.
pub trait AvatarSource {
    fn avatar(&self, gender: Gender) -> Option<String>;
}

/// Plain coloured circles only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAvatars;

impl AvatarSource for NoAvatars {
    fn avatar(&self, _gender: Gender) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarPaths {
    pub male: Option<String>,
    pub female: Option<String>,
}

impl AvatarSource for AvatarPaths {
    fn avatar(&self, gender: Gender) -> Option<String> {
        match gender {
            Gender::Male => self.male.clone(),
            Gender::Female => self.female.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_picked_by_gender() {
        let paths = AvatarPaths {
            male: Some("m.png".into()),
            female: None,
        };
        assert_eq!(paths.avatar(Gender::Male).as_deref(), Some("m.png"));
        assert_eq!(paths.avatar(Gender::Female), None);
        assert_eq!(NoAvatars.avatar(Gender::Male), None);
    }
}
