//! Player order aggregation.
//!
//! The session consumes orders through the [`PlayerOrderService`] trait
//! and treats the implementation as a black box with three guarantees:
//! orders accumulate monotonically within a turn, they are cleared only at
//! turn end, and every mutation fires a change notification — which is the
//! sole trigger for network propagation.

use std::sync::Mutex;

use supremacy_protocol::Order;
use tokio::sync::mpsc;

/// The session's view of the local player's order batch.
pub trait PlayerOrderService: Send + Sync + 'static {
    /// The full current batch, in submission order.
    fn orders(&self) -> Vec<Order>;

    /// Whether the player wants future turns auto-ended.
    fn auto_turn(&self) -> bool;

    fn set_auto_turn(&self, enabled: bool);

    /// Drops the whole batch. Called when all players' turns have ended
    /// so no stale orders leak into the next turn.
    fn clear_orders(&self);

    /// Registers a change listener. One `()` is delivered per mutation.
    fn subscribe_changes(&self) -> mpsc::UnboundedReceiver<()>;
}

/// Default in-memory order store.
#[derive(Default)]
pub struct LocalOrderStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    orders: Vec<Order>,
    auto_turn: bool,
    listeners: Vec<mpsc::UnboundedSender<()>>,
}

impl LocalOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one order to the current batch.
    pub fn add_order(&self, order: Order) {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.push(order);
        Self::notify(&mut inner);
    }

    fn notify(inner: &mut StoreInner) {
        inner.listeners.retain(|tx| tx.send(()).is_ok());
    }
}

impl PlayerOrderService for LocalOrderStore {
    fn orders(&self) -> Vec<Order> {
        self.inner.lock().unwrap().orders.clone()
    }

    fn auto_turn(&self) -> bool {
        self.inner.lock().unwrap().auto_turn
    }

    fn set_auto_turn(&self, enabled: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.auto_turn = enabled;
        Self::notify(&mut inner);
    }

    fn clear_orders(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.clear();
        Self::notify(&mut inner);
    }

    fn subscribe_changes(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().listeners.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supremacy_protocol::ObjectId;

    fn order(id: i32) -> Order {
        Order {
            object_id: ObjectId(id),
            directive: vec![],
        }
    }

    #[test]
    fn test_orders_accumulate_in_submission_order() {
        let store = LocalOrderStore::new();
        store.add_order(order(1));
        store.add_order(order(2));
        store.add_order(order(3));

        let ids: Vec<i32> =
            store.orders().iter().map(|o| o.object_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_orders_empties_batch() {
        let store = LocalOrderStore::new();
        store.add_order(order(1));
        store.clear_orders();
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn test_every_mutation_fires_change() {
        let store = LocalOrderStore::new();
        let mut changes = store.subscribe_changes();

        store.add_order(order(1));
        store.add_order(order(2));
        store.clear_orders();

        for _ in 0..3 {
            changes.recv().await.expect("change notification");
        }
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_auto_turn_round_trips() {
        let store = LocalOrderStore::new();
        assert!(!store.auto_turn());
        store.set_auto_turn(true);
        assert!(store.auto_turn());
    }
}
