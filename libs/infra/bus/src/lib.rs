// [libs/infra/bus/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ROOM FAN-OUT BUS (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUBLICACIÓN/SUSCRIPCIÓN POR SALA, NO BLOQUEANTE
 *
 * VISION:
 * Generaliza el bus de eventos único del linaje original a un
 * registro de salas nombradas, cada una respaldada por su propio
 * canal `broadcast`. El trait `Broker` es la costura donde un
 * backend externo (p. ej. Redis pub/sub) reemplazaría el registro
 * en proceso sin tocar a los llamadores.
 *
 * # Mathematical Proof (Non-Blocking Publish):
 * `broadcast::Sender::send` nunca espera a un suscriptor lento; un
 * suscriptor que se queda atrás observa `RecvError::Lagged` y, tras
 * cruzar el umbral de reintentos configurado, es desconectado — el
 * publicador jamás se bloquea por su causa.
 * =================================================================
 */

pub mod envelope;

use dashmap::DashMap;
use envelope::BusEnvelope;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Channel capacity per room; also the de facto high-water mark — a
/// subscriber whose consumption lags this many messages behind starts
/// receiving `Lagged` errors and, past `MAX_CONSECUTIVE_LAG_BEFORE_DROP`,
/// is dropped by its own receive loop.
pub const ROOM_CHANNEL_CAPACITY: usize = 1024;
pub const MAX_CONSECUTIVE_LAG_BEFORE_DROP: u32 = 5;

/// The pub/sub abstraction boundary. The HTTP edge and every background
/// worker hold a clone of the same broker handle so a publish from either
/// process reaches every subscriber of the target room.
pub trait Broker: Send + Sync {
    fn publish(&self, room: &str, envelope: BusEnvelope);
    fn subscribe(&self, room: &str) -> RoomSubscription;
}

/// Process-wide registry of named broadcast channels. This is the default
/// broker implementation; it satisfies the multi-process contract only
/// within a single OS process — the trait boundary is what a Redis-backed
/// broker would implement to extend it across processes.
#[derive(Clone, Default)]
pub struct InProcessBroker {
    rooms: Arc<DashMap<String, broadcast::Sender<BusEnvelope>>>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, room: &str) -> broadcast::Sender<BusEnvelope> {
        self.rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Broker for InProcessBroker {
    fn publish(&self, room: &str, envelope: BusEnvelope) {
        let sender = self.sender_for(room);
        // A send error only means "zero subscribers right now" — not fatal,
        // the room still exists for the next subscriber to join.
        if sender.send(envelope).is_err() {
            debug!(room, "📭 [BUS_EMPTY_ROOM]: publish with no active subscribers");
        }
    }

    fn subscribe(&self, room: &str) -> RoomSubscription {
        let sender = self.sender_for(room);
        RoomSubscription {
            room: room.to_string(),
            receiver: sender.subscribe(),
            consecutive_lag: 0,
        }
    }
}

/// A single subscriber's view of one room. Disconnect (dropping this
/// value) removes the subscriber from the room with no further bookkeeping
/// required, since the underlying `broadcast::Receiver` deregisters itself.
pub struct RoomSubscription {
    room: String,
    receiver: broadcast::Receiver<BusEnvelope>,
    consecutive_lag: u32,
}

pub enum RoomRecv {
    Message(BusEnvelope),
    Lagged(u64),
    Closed,
}

impl RoomSubscription {
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Receives the next envelope, tracking consecutive lag events so the
    /// caller can apply the high-water-mark drop policy via `should_drop`.
    pub async fn recv(&mut self) -> RoomRecv {
        match self.receiver.recv().await {
            Ok(envelope) => {
                self.consecutive_lag = 0;
                RoomRecv::Message(envelope)
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                self.consecutive_lag += 1;
                warn!(
                    room = %self.room,
                    missed,
                    consecutive_lag = self.consecutive_lag,
                    "🐢 [BUS_LAG]: subscriber fell behind"
                );
                RoomRecv::Lagged(missed)
            }
            Err(broadcast::error::RecvError::Closed) => RoomRecv::Closed,
        }
    }

    pub fn should_drop(&self) -> bool {
        self.consecutive_lag >= MAX_CONSECUTIVE_LAG_BEFORE_DROP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envelope::rooms;

    #[tokio::test]
    async fn publish_reaches_every_subscriber_of_the_room() {
        let broker = InProcessBroker::new();
        let mut sub_a = broker.subscribe(rooms::ALERTS);
        let mut sub_b = broker.subscribe(rooms::ALERTS);

        broker.publish(
            rooms::ALERTS,
            BusEnvelope::TelegramProcessing {
                message_id: uuid::Uuid::new_v4(),
                status: "processing".into(),
            },
        );

        assert!(matches!(sub_a.recv().await, RoomRecv::Message(_)));
        assert!(matches!(sub_b.recv().await, RoomRecv::Message(_)));
    }

    #[tokio::test]
    async fn rooms_do_not_cross_talk() {
        let broker = InProcessBroker::new();
        let mut alerts_sub = broker.subscribe(rooms::ALERTS);
        broker.publish(
            rooms::LIVEMAP,
            BusEnvelope::TelegramProcessing {
                message_id: uuid::Uuid::new_v4(),
                status: "processing".into(),
            },
        );

        let timeout = tokio::time::timeout(std::time::Duration::from_millis(50), alerts_sub.recv());
        assert!(timeout.await.is_err(), "alerts room must not see livemap publishes");
    }
}
