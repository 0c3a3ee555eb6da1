use serde_json::Value;

use super::GlobalSync;

/// The hosted document as seen from the host. Every access is fallible:
/// the document may be cross-origin, not yet loaded, or already gone.
pub trait WidgetSurface {
    /// Posts a message to the hosted document's window.
    fn post_message(&self, message: &Value) -> anyhow::Result<()>;

    /// Writes a value into the hosted document's global scope and
    /// dispatches the matching event there.
    fn sync_globals(&self, sync: &GlobalSync) -> anyhow::Result<()>;

    /// Height of the hosted content in CSS pixels, `None` when the
    /// document cannot be measured.
    fn content_height(&self) -> Option<f64>;
}
