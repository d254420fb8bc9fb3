/// A chat-platform-neutral rendering of one stream announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub url: String,
    pub author: NotificationAuthor,
    pub color: u32,
    /// Large image, the live preview.
    pub image_url: String,
    /// Small image, the game box art.
    pub thumbnail_url: String,
    pub fields: Vec<NotificationField>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}
