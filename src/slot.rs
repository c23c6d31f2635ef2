/// The outcome of every image pipeline stage: either an image made it through, or
/// there is no image. `Absent` is a normal terminal state (missing URI, failed fetch,
/// undecodable bytes...) and is never an error for the export as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSlot<T> {
    Present(T),
    Absent,
}

impl<T> ImageSlot<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, ImageSlot::Present(_))
    }

    pub fn as_ref(&self) -> ImageSlot<&T> {
        match self {
            ImageSlot::Present(value) => ImageSlot::Present(value),
            ImageSlot::Absent => ImageSlot::Absent,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ImageSlot<U> {
        match self {
            ImageSlot::Present(value) => ImageSlot::Present(f(value)),
            ImageSlot::Absent => ImageSlot::Absent,
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> ImageSlot<U>>(self, f: F) -> ImageSlot<U> {
        match self {
            ImageSlot::Present(value) => f(value),
            ImageSlot::Absent => ImageSlot::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            ImageSlot::Present(value) => Some(value),
            ImageSlot::Absent => None,
        }
    }
}

impl<T> Default for ImageSlot<T> {
    fn default() -> Self {
        ImageSlot::Absent
    }
}

impl<T> From<Option<T>> for ImageSlot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => ImageSlot::Present(value),
            None => ImageSlot::Absent,
        }
    }
}
