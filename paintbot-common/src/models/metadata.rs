#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub login: String,
    pub display_name: String,
    /// Profile image, with the size placeholders left in.
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub title: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    pub name: String,
    /// Box art, with `{width}`/`{height}` placeholders.
    pub box_art_url: String,
}

/// Everything the renderer needs besides the channel itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub game_name: String,
    pub box_art_url: String,
    pub thumbnail_url: String,
}
