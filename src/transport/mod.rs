//! TCP transport layer.
//!
//! This module owns the socket to the vision service and the byte-level
//! framing of commands and responses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                        ┌─────────────────┐
//! │  ConnectionManager   │                        │  Vision service │
//! │                      │    one TCP socket      │                 │
//! │  connection gate ──► │◄──────────────────────►│  line-oriented  │
//! │  exchange gate   ──► │   command + terminator │  text protocol  │
//! └──────────────────────┘                        └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ConnectionManager::new` - Store options, no I/O
//! 2. First command (or `connect`) - Open the socket under the connection gate
//! 3. `send_command` - Drain, write, read under the exchange gate
//! 4. Transport failure or `configure` - Drop the socket
//! 5. Next command - Reconnect
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `framing` | Terminator-based command and response framing |
//! | `manager` | Connection lifecycle and serialized exchanges |

// ============================================================================
// Submodules
// ============================================================================

/// Terminator-based framing.
pub mod framing;

/// Connection lifecycle management.
pub mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub use framing::Terminators;
pub use manager::{ConnectionManager, ConnectionState};
