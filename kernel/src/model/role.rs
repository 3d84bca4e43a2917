use strum::{AsRefStr, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr, EnumIter)]
pub enum Role {
    Admin,
    #[default]
    User,
}
