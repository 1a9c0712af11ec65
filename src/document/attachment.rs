//! Inline attachments carried by the object replacement character

use uuid::Uuid;

/// Character that anchors an attachment in the plain text
pub const ATTACHMENT_CHAR: char = '\u{FFFC}';

/// Horizontal placement of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageAlignment {
    Left,
    #[default]
    Center,
    Right,
    Inline,
}

/// Caption shown under an image
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub style_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub id: Uuid,
    pub bytes: Option<Vec<u8>>,
    pub display_scale: f32,
    pub alignment: ImageAlignment,
    pub caption: Option<Caption>,
    pub source_file_id: Option<Uuid>,
    pub original_filename: Option<String>,
}

impl ImageAttachment {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes: Some(bytes),
            display_scale: 1.0,
            alignment: ImageAlignment::default(),
            caption: None,
            source_file_id: None,
            original_filename: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentAttachment {
    pub id: Uuid,
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootnoteAttachment {
    pub id: Uuid,
    pub number: u32,
}

/// Exactly one attachment kind per attribute slot
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Image(ImageAttachment),
    Comment(CommentAttachment),
    Footnote(FootnoteAttachment),
}

impl Attachment {
    pub fn id(&self) -> Uuid {
        match self {
            Attachment::Image(image) => image.id,
            Attachment::Comment(comment) => comment.id,
            Attachment::Footnote(footnote) => footnote.id,
        }
    }

    /// Wire tag of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::Image(_) => "image",
            Attachment::Comment(_) => "comment",
            Attachment::Footnote(_) => "footnote",
        }
    }
}
