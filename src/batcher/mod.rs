// Client-side mutation batching: optimistic updates now, one request per burst.
//
// throttled.rs is the generic per-key batcher, transport.rs is the seam to
// the network, and presets.rs wires up the dislike and reaction endpoints.

pub mod presets;
pub mod throttled;
pub mod transport;

pub use throttled::{ThrottledMutation, ThrottledMutationBuilder, DEFAULT_QUIET_PERIOD};
pub use transport::{FlushError, HttpTransport, MutationReply, MutationTransport};
