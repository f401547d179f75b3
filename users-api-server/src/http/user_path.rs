/// Outcome of reading a user id from the path remainder after `/users/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserPath {
    Id(i32),
    Invalid,
}

impl UserPath {
    /// `rest` is the path after `/users/`. Only the first segment is read;
    /// anything after the next `/` is ignored, so `1/extra` and `1/` resolve
    /// like `1`, while `/1` has an empty first segment.
    pub fn parse(rest: &str) -> Self {
        let segment = rest.split('/').next().unwrap_or_default();
        segment.parse().map_or(Self::Invalid, Self::Id)
    }
}
