//! Adaptive feedback: interactions strengthen a node's edges.

use std::sync::Arc;

use crate::engine::GraphEngine;
use crate::models::Interaction;
use crate::query::Connection;

impl GraphEngine {
    /// Record an interaction with `node_id`.
    ///
    /// The node's click count goes up by one and each incident edge weight
    /// becomes `min(weight × boost_factor, 1.0)` with `user_boosted` set.
    /// Returns the node's updated connections, or `None` when the id is not
    /// in the graph (nothing is changed in that case).
    pub fn record_interaction(&self, node_id: &str, interaction: Interaction) -> Option<Vec<Connection>> {
        let mut guard = self.graph.write();
        let Some(position) = guard.position(node_id) else {
            tracing::warn!(node_id, kind = %interaction.interaction_type, "interaction for unknown node ignored");
            return None;
        };

        let graph = Arc::make_mut(&mut *guard);
        graph.boost_incident(position, self.config.boost_factor);
        let connections = graph.connections(node_id);

        tracing::debug!(
            node_id,
            kind = %interaction.interaction_type,
            duration = ?interaction.duration,
            boosted = connections.len(),
            "recorded interaction"
        );
        Some(connections)
    }
}
