/// Describes how the overridden values are combined with the downloaded config JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideBehavior {
    /// Only the local values are used, the client never downloads the config JSON.
    LocalOnly,
    /// Local values take precedence over the downloaded ones.
    LocalOverRemote,
    /// Downloaded values take precedence over the local ones.
    RemoteOverLocal,
}
