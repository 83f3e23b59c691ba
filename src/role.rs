//! Endpoint role (client or server).

/// WebSocket endpoint role.
///
/// Decides which half of the negotiated `server_*` / `client_*`
/// parameters applies to each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Client role - compresses with `client_*` parameters.
    Client,
    /// Server role - compresses with `server_*` parameters.
    Server,
}

impl Role {
    /// The role of the remote endpoint.
    #[inline]
    #[must_use]
    pub const fn peer(&self) -> Role {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "Client"),
            Role::Server => write!(f, "Server"),
        }
    }
}
