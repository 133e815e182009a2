//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    messages::{
        NotificationKind, TableMessage, TableNotification, TableResponse, TableSnapshot,
        VacateReason,
    },
    timers::{TableTimers, TimerSlot},
};
use crate::{
    bot::{BotPolicy, BotPolicyConfig, autoplay::apply_action, bot_player},
    economy::{Payout, Settlement},
    game::{
        GameError, GameEvent, GameStateManagement, PlayerView, SeatManagement, Severity,
        SpadesState, TurnKey,
        constants::PLAYERS,
        entities::{Bid, Card, GameStatus, Player, PlayerKind, SeatIndex, TableId, UserId},
        scoring::GameResult,
    },
    recorder::{
        BidRecord, GameRecorder, GameResultRecord, HandDealtRecord, HandScoreRecord,
        RecordEntry, TrickRecord,
    },
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }

    async fn request<R>(&self, build: impl FnOnce(oneshot::Sender<R>) -> TableMessage) -> Option<R> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await.ok()?;
        rx.await.ok()
    }

    async fn intent(
        &self,
        build: impl FnOnce(oneshot::Sender<TableResponse>) -> TableMessage,
    ) -> TableResponse {
        self.request(build).await.unwrap_or_else(TableResponse::closed)
    }

    pub async fn join_seat(
        &self,
        user_id: UserId,
        username: impl Into<String>,
        seat: Option<SeatIndex>,
    ) -> TableResponse {
        let username = username.into();
        self.intent(|response| TableMessage::JoinSeat {
            user_id,
            username,
            seat,
            response,
        })
        .await
    }

    pub async fn leave_seat(&self, user_id: UserId) -> TableResponse {
        self.intent(|response| TableMessage::LeaveSeat { user_id, response })
            .await
    }

    pub async fn submit_bid(&self, user_id: UserId, bid: Bid) -> TableResponse {
        self.intent(|response| TableMessage::SubmitBid {
            user_id,
            bid,
            response,
        })
        .await
    }

    pub async fn play_card(&self, user_id: UserId, card: Card) -> TableResponse {
        self.intent(|response| TableMessage::PlayCard {
            user_id,
            card,
            response,
        })
        .await
    }

    pub async fn request_bot_fill(&self, user_id: UserId, seat: SeatIndex) -> TableResponse {
        self.intent(|response| TableMessage::RequestBotFill {
            user_id,
            seat,
            response,
        })
        .await
    }

    pub async fn get_hand(&self, user_id: UserId) -> TableResponse {
        self.intent(|response| TableMessage::GetHand { user_id, response })
            .await
    }

    pub async fn play_again(&self, user_id: UserId) -> TableResponse {
        self.intent(|response| TableMessage::PlayAgain { user_id, response })
            .await
    }

    pub async fn close(&self) -> TableResponse {
        self.intent(|response| TableMessage::Close { response }).await
    }

    /// Current public state, or `None` once the table is gone
    pub async fn snapshot(&self) -> Option<TableSnapshot> {
        self.request(|response| TableMessage::GetSnapshot { response })
            .await
    }

    pub async fn player_view(&self, user_id: UserId) -> Option<PlayerView> {
        self.request(|response| TableMessage::GetPlayerView { user_id, response })
            .await
            .flatten()
    }

    pub async fn subscribe(&self, user_id: UserId, sender: mpsc::Sender<TableNotification>) {
        let _ = self.send(TableMessage::Subscribe { user_id, sender }).await;
    }

    pub async fn unsubscribe(&self, user_id: UserId) {
        let _ = self.send(TableMessage::Unsubscribe { user_id }).await;
    }
}

/// Table actor managing a single spades table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    /// Spades game state (FSM)
    state: SpadesState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Turn, seat replacement and rematch timers
    timers: TableTimers,

    /// Turn the armed turn timer belongs to
    armed_turn: Option<TurnKey>,

    /// Decides for bots and for humans that ran out of time
    policy: BotPolicy,

    /// Persistence collaborator
    recorder: Arc<dyn GameRecorder>,

    /// Economy collaborator
    settlement: Arc<dyn Settlement>,

    /// Consecutive turn timeouts per seat
    timeouts: [u32; PLAYERS],

    /// Seats vacated mid-game, waiting for a replacement
    vacated: BTreeSet<SeatIndex>,

    /// Humans that confirmed a rematch
    play_again: HashSet<UserId>,

    /// Is table closed
    is_closed: bool,

    /// Subscribers for state change notifications
    subscribers: HashMap<UserId, mpsc::Sender<TableNotification>>,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `config` - Table configuration, assumed validated
    /// * `recorder` - Where hands, tricks and results are logged
    /// * `settlement` - Pays out finished games
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TableId,
        config: TableConfig,
        recorder: Arc<dyn GameRecorder>,
        settlement: Arc<dyn Settlement>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);

        let state = SpadesState::new(config.game_settings());
        let timers = TableTimers::new(sender.downgrade());

        let actor = Self {
            id,
            config,
            state,
            inbox,
            timers,
            armed_turn: None,
            policy: BotPolicy::new(BotPolicyConfig::default()),
            recorder,
            settlement,
            timeouts: [0; PLAYERS],
            vacated: BTreeSet::new(),
            play_again: HashSet::new(),
            is_closed: false,
            subscribers: HashMap::new(),
        };

        let handle = TableHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);

            if self.is_closed {
                break;
            }
        }

        self.timers.cancel_all();
        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message. One message is fully applied before the
    /// next is read.
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::JoinSeat {
                user_id,
                username,
                seat,
                response,
            } => {
                let result = self.handle_join(user_id, username, seat);
                let _ = response.send(result);
            }

            TableMessage::LeaveSeat { user_id, response } => {
                let result = self.handle_leave(user_id);
                let _ = response.send(result);
            }

            TableMessage::SubmitBid {
                user_id,
                bid,
                response,
            } => {
                let result = self.handle_bid(user_id, bid);
                let _ = response.send(result);
            }

            TableMessage::PlayCard {
                user_id,
                card,
                response,
            } => {
                let result = self.handle_play(user_id, card);
                let _ = response.send(result);
            }

            TableMessage::RequestBotFill {
                user_id,
                seat,
                response,
            } => {
                let result = self.handle_bot_fill(user_id, seat);
                let _ = response.send(result);
            }

            TableMessage::GetHand { user_id, response } => {
                let result = self.handle_get_hand(user_id);
                let _ = response.send(result);
            }

            TableMessage::PlayAgain { user_id, response } => {
                let result = self.handle_play_again(user_id);
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { response } => {
                let _ = response.send(self.snapshot());
            }

            TableMessage::GetPlayerView { user_id, response } => {
                let view = self
                    .state
                    .seat_of(user_id)
                    .map(|seat| self.state.player_view(seat));
                let _ = response.send(view);
            }

            TableMessage::Subscribe { user_id, sender } => {
                self.subscribers.insert(user_id, sender);
                log::debug!(
                    "Table {}: User {} subscribed to notifications",
                    self.id,
                    user_id
                );
            }

            TableMessage::Unsubscribe { user_id } => {
                self.subscribers.remove(&user_id);
                log::debug!(
                    "Table {}: User {} unsubscribed from notifications",
                    self.id,
                    user_id
                );
            }

            TableMessage::Close { response } => {
                self.teardown("closed by request");
                let _ = response.send(TableResponse::Success);
            }

            TableMessage::TimerFired { slot, generation } => {
                if !self.timers.take_if_current(slot, generation) {
                    log::debug!("Table {}: ignoring stale {:?} timer", self.id, slot);
                    return;
                }
                match slot {
                    TimerSlot::Turn(seat) => self.handle_turn_timeout(seat),
                    TimerSlot::SeatReplacement(seat) => self.handle_replacement_timeout(seat),
                    TimerSlot::PlayAgain => self.handle_play_again_timeout(),
                }
            }
        }
    }

    fn handle_join(
        &mut self,
        user_id: UserId,
        username: String,
        seat: Option<SeatIndex>,
    ) -> TableResponse {
        if self.state.seat_of(user_id).is_some() {
            return GameError::AlreadySeated.into();
        }

        let seat = match seat {
            Some(seat) => seat,
            None => match self.state.data().open_seats().first() {
                Some(seat) => *seat,
                None => return GameError::TableFull.into(),
            },
        };

        let player = Player {
            id: user_id,
            name: username,
            kind: PlayerKind::Human,
            seat,
        };
        let name = player.name.clone();

        match self.state.seat_player(player) {
            Ok(seat) => {
                let replacing = self.vacated.remove(&seat);
                self.timers.cancel(TimerSlot::SeatReplacement(seat));
                self.timeouts[seat] = 0;
                log::info!(
                    "Table {}: {} took seat {}{}",
                    self.id,
                    name,
                    seat,
                    if replacing { " as a replacement" } else { "" }
                );
                self.notify(NotificationKind::SeatJoined { seat, user_id });
                self.advance();
                TableResponse::Seated { seat }
            }
            Err(err) => self.reject(err),
        }
    }

    fn handle_leave(&mut self, user_id: UserId) -> TableResponse {
        let Some(seat) = self.state.seat_of(user_id) else {
            return GameError::NotSeated.into();
        };
        match self.vacate(seat, VacateReason::Left) {
            Ok(()) => {
                if !self.is_closed && self.state.status() == GameStatus::Finished {
                    self.maybe_restart();
                }
                TableResponse::Success
            }
            Err(err) => self.reject(err),
        }
    }

    fn handle_bid(&mut self, user_id: UserId, bid: Bid) -> TableResponse {
        let Some(seat) = self.state.seat_of(user_id) else {
            return GameError::NotSeated.into();
        };
        match self.state.place_bid(seat, bid) {
            Ok(()) => {
                self.human_acted(seat);
                self.advance();
                TableResponse::Success
            }
            Err(err) => self.reject(err),
        }
    }

    fn handle_play(&mut self, user_id: UserId, card: Card) -> TableResponse {
        let Some(seat) = self.state.seat_of(user_id) else {
            return GameError::NotSeated.into();
        };
        match self.state.play_card(seat, card) {
            Ok(()) => {
                self.human_acted(seat);
                self.advance();
                TableResponse::Success
            }
            Err(err) => self.reject(err),
        }
    }

    /// Only seated humans may ask for bots, so a table can never be left
    /// to bots alone.
    fn handle_bot_fill(&mut self, user_id: UserId, seat: SeatIndex) -> TableResponse {
        if self.state.seat_of(user_id).is_none() {
            return GameError::NotSeated.into();
        }
        match self.insert_bot(seat) {
            Ok(()) => {
                self.advance();
                TableResponse::Success
            }
            Err(err) => self.reject(err),
        }
    }

    fn handle_get_hand(&mut self, user_id: UserId) -> TableResponse {
        let Some(seat) = self.state.seat_of(user_id) else {
            return GameError::NotSeated.into();
        };
        match self.state.reveal_hand(seat) {
            Ok(cards) => TableResponse::Hand(cards),
            Err(err) => self.reject(err),
        }
    }

    fn handle_play_again(&mut self, user_id: UserId) -> TableResponse {
        if self.state.status() != GameStatus::Finished {
            return GameError::PhaseMismatch(self.state.status().to_string()).into();
        }
        if self.state.seat_of(user_id).is_none() {
            return GameError::NotSeated.into();
        }
        self.play_again.insert(user_id);
        log::debug!("Table {}: User {} wants a rematch", self.id, user_id);
        self.maybe_restart();
        TableResponse::Success
    }

    /// The seat owing a move ran out of time.
    fn handle_turn_timeout(&mut self, seat: SeatIndex) {
        let armed = self.armed_turn.take();
        let pending = self.state.pending_turn();
        if pending.map(|turn| (turn.seat, Some(turn.key))) != Some((seat, armed)) {
            log::debug!("Table {}: turn timer for seat {} outlived its turn", self.id, seat);
            return;
        }

        self.timeouts[seat] += 1;
        if self.timeouts[seat] >= self.config.max_consecutive_timeouts {
            log::info!(
                "Table {}: seat {} timed out {} times in a row, removing player",
                self.id,
                seat,
                self.timeouts[seat]
            );
            if let Err(err) = self.vacate(seat, VacateReason::TimedOut) {
                self.fail(err);
            }
            return;
        }

        let Some(action) = self.policy.decide(&self.state, seat) else {
            self.fail(GameError::Corrupted(format!(
                "no substitute move for seat {seat}"
            )));
            return;
        };
        log::info!(
            "Table {}: seat {} timed out ({}), acting with {:?}",
            self.id,
            seat,
            self.timeouts[seat],
            action
        );
        match apply_action(&mut self.state, seat, action) {
            Ok(()) => {
                self.notify(NotificationKind::PlayerTimedOut { seat, action });
                self.advance();
            }
            Err(err) => self.fail(err),
        }
    }

    fn handle_replacement_timeout(&mut self, seat: SeatIndex) {
        self.vacated.remove(&seat);
        if !self.state.is_in_progress() || self.state.data().player(seat).is_some() {
            return;
        }
        log::info!("Table {}: nobody took seat {}, inserting a bot", self.id, seat);
        match self.insert_bot(seat) {
            Ok(()) => self.advance(),
            Err(err) => self.fail(err),
        }
    }

    /// Humans that didn't confirm a rematch lose their seats.
    fn handle_play_again_timeout(&mut self) {
        if self.state.status() != GameStatus::Finished {
            return;
        }
        let stragglers: Vec<SeatIndex> = (0..PLAYERS)
            .filter(|seat| {
                self.state
                    .data()
                    .player(*seat)
                    .is_some_and(|player| !player.is_bot() && !self.play_again.contains(&player.id))
            })
            .collect();
        for seat in stragglers {
            if let Err(err) = self.vacate(seat, VacateReason::NoRematch) {
                self.fail(err);
            }
            if self.is_closed {
                return;
            }
        }
        self.restart();
    }

    /// Start the rematch once every seated human confirmed.
    fn maybe_restart(&mut self) {
        let data = self.state.data();
        let all_confirmed = data
            .players
            .iter()
            .flatten()
            .filter(|player| !player.is_bot())
            .all(|player| self.play_again.contains(&player.id));
        if all_confirmed && data.human_count() > 0 {
            self.restart();
        }
    }

    /// Fresh game with the same seats.
    fn restart(&mut self) {
        self.timers.cancel_all();
        self.armed_turn = None;
        self.play_again.clear();
        self.vacated.clear();
        self.timeouts = [0; PLAYERS];

        let state = std::mem::take(&mut self.state);
        self.state = state.reset();
        let game_id = self.state.data().id;
        log::info!("Table {}: starting over with game {}", self.id, game_id);
        self.notify(NotificationKind::GameReset { game_id });
        self.advance();
    }

    fn insert_bot(&mut self, seat: SeatIndex) -> Result<(), GameError> {
        let seat = self.state.seat_player(bot_player(seat))?;
        self.vacated.remove(&seat);
        self.timers.cancel(TimerSlot::SeatReplacement(seat));
        self.timeouts[seat] = 0;
        self.notify(NotificationKind::BotInserted { seat });
        Ok(())
    }

    /// Remove whoever sits in `seat`. Mid-game the seat keeps its cards and
    /// waits for a replacement.
    fn vacate(&mut self, seat: SeatIndex, reason: VacateReason) -> Result<(), GameError> {
        let player = self.state.vacate_seat(seat)?;
        self.timeouts[seat] = 0;
        self.play_again.remove(&player.id);
        if self.timers.cancel(TimerSlot::Turn(seat)) {
            self.armed_turn = None;
        }

        if self.state.is_in_progress() {
            self.vacated.insert(seat);
            self.timers.arm(
                TimerSlot::SeatReplacement(seat),
                self.config.seat_replacement_timeout(),
            );
        }

        log::info!(
            "Table {}: {} left seat {} ({:?})",
            self.id,
            player.name,
            seat,
            reason
        );
        self.notify(NotificationKind::SeatVacated {
            seat,
            user_id: player.id,
            reason,
        });

        if !player.is_bot() && self.state.data().human_count() == 0 {
            self.teardown("no humans left");
        }
        Ok(())
    }

    fn human_acted(&mut self, seat: SeatIndex) {
        self.timeouts[seat] = 0;
        if self.timers.cancel(TimerSlot::Turn(seat)) {
            self.armed_turn = None;
        }
    }

    /// Drive the game until it needs a human, a replacement, or nothing
    /// at all. Bots act inline.
    fn advance(&mut self) {
        loop {
            let state = std::mem::take(&mut self.state);
            self.state = state.step();
            self.flush_events();
            if self.is_closed {
                return;
            }

            let Some(turn) = self.state.pending_turn() else {
                break;
            };
            let is_bot = match self.state.data().player(turn.seat) {
                // Vacated; the replacement timer covers it.
                None => break,
                Some(player) => player.is_bot(),
            };

            if !is_bot {
                self.arm_turn(turn.seat, turn.key);
                break;
            }

            let Some(action) = self.policy.decide(&self.state, turn.seat) else {
                self.fail(GameError::Corrupted(format!(
                    "bot in seat {} has no move",
                    turn.seat
                )));
                return;
            };
            if let Err(err) = apply_action(&mut self.state, turn.seat, action) {
                self.fail(err);
                return;
            }
        }

        if self.state.status() == GameStatus::Finished && !self.timers.is_armed(TimerSlot::PlayAgain) {
            self.timers.cancel_turns();
            self.armed_turn = None;
            self.timers
                .arm(TimerSlot::PlayAgain, self.config.play_again_timeout());
        }
    }

    fn arm_turn(&mut self, seat: SeatIndex, key: TurnKey) {
        if self.armed_turn == Some(key) && self.timers.is_armed(TimerSlot::Turn(seat)) {
            return;
        }
        self.timers.cancel_turns();
        self.timers
            .arm(TimerSlot::Turn(seat), self.config.turn_timeout());
        self.armed_turn = Some(key);
    }

    /// Turn drained game events into notifications and background records.
    fn flush_events(&mut self) {
        let events = self.state.drain_events();
        if events.is_empty() {
            return;
        }
        let game_id = self.state.data().id;
        let mut kinds = Vec::with_capacity(events.len());

        for event in events {
            log::debug!("Table {}: {}", self.id, event);
            match event {
                GameEvent::GameStarted { game_id, dealer } => {
                    log::info!("Table {}: game {} started", self.id, game_id);
                    kinds.push(NotificationKind::GameStarted { game_id, dealer });
                }
                GameEvent::HandDealt {
                    hand_no,
                    dealer,
                    hands,
                } => {
                    self.record(RecordEntry::HandDealt(HandDealtRecord {
                        table_id: self.id,
                        game_id,
                        hand_no,
                        dealer,
                        hands,
                    }));
                    kinds.push(NotificationKind::HandDealt { hand_no, dealer });
                }
                GameEvent::BidPlaced { hand_no, seat, bid } => {
                    self.record(RecordEntry::Bid(BidRecord {
                        table_id: self.id,
                        game_id,
                        hand_no,
                        seat,
                        bid,
                    }));
                    kinds.push(NotificationKind::BidUpdated { seat, bid });
                }
                GameEvent::BiddingComplete { .. } => {}
                GameEvent::CardPlayed { seat, card, .. } => {
                    kinds.push(NotificationKind::CardPlayed { seat, card });
                }
                GameEvent::TrickResolved { hand_no, trick } => {
                    self.record(RecordEntry::Trick(TrickRecord {
                        table_id: self.id,
                        game_id,
                        hand_no,
                        trick: trick.clone(),
                    }));
                    kinds.push(NotificationKind::TrickResolved { trick });
                }
                GameEvent::HandScored(summary) => {
                    self.record(RecordEntry::HandScore(HandScoreRecord {
                        table_id: self.id,
                        game_id,
                        summary: summary.clone(),
                    }));
                    kinds.push(NotificationKind::HandCompleted { summary });
                }
                GameEvent::TiedAtThreshold { hand_no } => {
                    log::info!(
                        "Table {}: scores tied at the threshold after hand {}, playing on",
                        self.id,
                        hand_no
                    );
                }
                GameEvent::FailsafeApplied {
                    hand_no,
                    tricks_played,
                } => {
                    log::warn!(
                        "Table {}: hand {} completed by failsafe after {} tricks",
                        self.id,
                        hand_no,
                        tricks_played
                    );
                    kinds.push(NotificationKind::FailsafeApplied {
                        hand_no,
                        tricks_played,
                    });
                }
                GameEvent::GameOver(result) => {
                    log::info!(
                        "Table {}: game {} over after {} hands, {:?} wins",
                        self.id,
                        result.game_id,
                        result.hands_played,
                        result.winner
                    );
                    self.record(RecordEntry::GameResult(GameResultRecord {
                        table_id: self.id,
                        result: result.clone(),
                    }));
                    self.settle(&result);
                    kinds.push(NotificationKind::GameOver { result });
                }
            }
        }

        self.notify_all(kinds);
    }

    /// Hand a record to the recorder without waiting for it.
    fn record(&self, entry: RecordEntry) {
        let recorder = Arc::clone(&self.recorder);
        let table_id = self.id;
        tokio::spawn(async move {
            if let Err(e) = recorder.record(entry).await {
                log::warn!("Table {}: failed to record: {}", table_id, e);
            }
        });
    }

    /// Pay out a finished game in the background.
    fn settle(&self, result: &GameResult) {
        let winning_seats = result.winner.seats();
        let (mut winners, mut losers) = (Vec::new(), Vec::new());
        for (seat, player) in self.state.data().players.iter().enumerate() {
            match player {
                Some(player) if !player.is_bot() => {
                    if winning_seats.contains(&seat) {
                        winners.push(player.id);
                    } else {
                        losers.push(player.id);
                    }
                }
                _ => {}
            }
        }

        let payout = Payout {
            table_id: self.id,
            game_id: result.game_id,
            buy_in: self.config.buy_in,
            winners,
            losers,
            result: result.clone(),
        };
        let settlement = Arc::clone(&self.settlement);
        let table_id = self.id;
        tokio::spawn(async move {
            if let Err(e) = settlement.settle_game(payout).await {
                log::error!("Table {}: settlement failed: {}", table_id, e);
            }
        });
    }

    /// Turn a refused intent into a response. Invalid-state errors are
    /// logged; fatal ones also abort the game.
    fn reject(&mut self, err: GameError) -> TableResponse {
        match err.severity() {
            Severity::Validation => {
                log::debug!("Table {}: rejected intent: {}", self.id, err);
            }
            Severity::InvalidState => {
                log::error!("Table {}: dropped intent: {}", self.id, err);
            }
            Severity::Fatal => self.fail(err.clone()),
        }
        err.into()
    }

    /// Errors the table itself ran into.
    fn fail(&mut self, err: GameError) {
        if err.is_fatal() {
            log::error!("Table {}: aborting game: {}", self.id, err);
            self.notify(NotificationKind::GameAborted {
                reason: err.client_message(),
            });
            self.teardown("game aborted");
        } else {
            log::error!("Table {}: {}", self.id, err);
        }
    }

    fn teardown(&mut self, reason: &str) {
        if self.is_closed {
            return;
        }
        log::info!("Table {}: tearing down ({})", self.id, reason);
        self.timers.cancel_all();
        self.armed_turn = None;
        self.is_closed = true;
        self.notify(NotificationKind::TableClosed);
    }

    fn snapshot(&self) -> TableSnapshot {
        let mut play_again: Vec<UserId> = self.play_again.iter().copied().collect();
        play_again.sort_unstable();
        TableSnapshot {
            table_id: self.id,
            table_name: self.config.name.clone(),
            game: self.state.view(),
            timeouts: self.timeouts.to_vec(),
            vacated: self.vacated.iter().copied().collect(),
            play_again,
            is_closed: self.is_closed,
        }
    }

    fn notify(&mut self, kind: NotificationKind) {
        self.notify_all(vec![kind]);
    }

    /// Broadcast to all subscribers. Full or closed channels are dropped,
    /// never awaited.
    fn notify_all(&mut self, kinds: Vec<NotificationKind>) {
        if kinds.is_empty() || self.subscribers.is_empty() {
            return;
        }
        let snapshot = Arc::new(self.snapshot());
        let table_id = self.id;
        for kind in kinds {
            let notification = TableNotification {
                table_id,
                kind,
                snapshot: Arc::clone(&snapshot),
            };
            self.subscribers.retain(|user_id, sender| {
                match sender.try_send(notification.clone()) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!("Subscriber {} channel full, dropping notification", user_id);
                        true
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        log::debug!("Subscriber {} disconnected, removing", user_id);
                        false
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        economy::NoopSettlement, game::entities::ActionKind, recorder::MemoryRecorder,
    };

    fn actor(config: TableConfig) -> (TableActor, TableHandle) {
        TableActor::new(
            1,
            config,
            Arc::new(MemoryRecorder::new()),
            Arc::new(NoopSettlement),
        )
    }

    fn seeded() -> TableConfig {
        TableConfig {
            seed: Some(11),
            ..Default::default()
        }
    }

    fn reply<R>() -> (oneshot::Sender<R>, oneshot::Receiver<R>) {
        oneshot::channel()
    }

    #[tokio::test]
    async fn join_takes_lowest_open_seat() {
        let (mut actor, _handle) = actor(seeded());
        assert_eq!(
            actor.handle_join(10, "alice".into(), None),
            TableResponse::Seated { seat: 0 }
        );
        assert_eq!(
            actor.handle_join(11, "bob".into(), Some(2)),
            TableResponse::Seated { seat: 2 }
        );
        assert_eq!(
            actor.handle_join(12, "carol".into(), None),
            TableResponse::Seated { seat: 1 }
        );
        let again = actor.handle_join(10, "alice".into(), None);
        assert!(!again.is_success());
    }

    #[tokio::test]
    async fn fourth_seat_starts_the_game() {
        let (mut actor, _handle) = actor(seeded());
        actor.handle_join(10, "alice".into(), None);
        for seat in 1..PLAYERS {
            assert!(actor.handle_bot_fill(10, seat).is_success());
        }
        assert!(actor.state.is_in_progress());
        // Bots bid until it's alice's turn.
        let turn = actor.state.pending_turn().unwrap();
        assert_eq!(turn.seat, 0);
        assert!(actor.timers.is_armed(TimerSlot::Turn(0)));
    }

    #[tokio::test]
    async fn bot_fill_needs_a_seated_requester() {
        let (mut actor, _handle) = actor(seeded());
        let response = actor.handle_bot_fill(99, 1);
        assert_eq!(response.error_code(), Some(crate::game::ErrorCode::NotSeated));
    }

    #[tokio::test]
    async fn out_of_turn_bid_is_rejected_without_change() {
        let (mut actor, _handle) = actor(seeded());
        actor.handle_join(10, "alice".into(), Some(0));
        actor.handle_join(11, "bob".into(), Some(1));
        actor.handle_bot_fill(10, 2);
        actor.handle_bot_fill(10, 3);
        let turn = actor.state.pending_turn().unwrap();
        let other = if turn.seat == 0 { 11 } else { 10 };
        let before = actor.state.view();
        let response = actor.handle_bid(other, Bid::Tricks(3));
        assert_eq!(response.error_code(), Some(crate::game::ErrorCode::NotYourTurn));
        assert_eq!(actor.state.view(), before);
    }

    #[tokio::test]
    async fn last_human_leaving_tears_down() {
        let (mut actor, _handle) = actor(seeded());
        actor.handle_join(10, "alice".into(), None);
        actor.handle_bot_fill(10, 1);
        assert!(actor.handle_leave(10).is_success());
        assert!(actor.is_closed);
    }

    #[tokio::test]
    async fn stale_timer_is_ignored() {
        let (mut actor, _handle) = actor(seeded());
        actor.handle_join(10, "alice".into(), None);
        for seat in 1..PLAYERS {
            actor.handle_bot_fill(10, seat);
        }
        let before = actor.state.view();
        actor.handle_message(TableMessage::TimerFired {
            slot: TimerSlot::Turn(0),
            generation: 0,
        });
        assert_eq!(actor.state.view(), before);
        assert_eq!(actor.timeouts[0], 0);
    }

    #[tokio::test]
    async fn timeout_without_substitute_aborts_table() {
        let (mut actor, _handle) = actor(seeded());
        actor.handle_join(10, "alice".into(), None);
        for seat in 1..PLAYERS {
            actor.handle_bot_fill(10, seat);
        }
        assert!(actor.handle_bid(10, Bid::Tricks(3)).is_success());
        let turn = actor.state.pending_turn().unwrap();
        assert_eq!((turn.seat, turn.kind), (0, ActionKind::Play));
        assert_eq!(actor.armed_turn, Some(turn.key));

        if let SpadesState::Playing(game) = &mut actor.state {
            game.data.hands[0].clear();
        }
        actor.handle_turn_timeout(0);

        assert!(actor.is_closed);
        assert!(!actor.timers.is_armed(TimerSlot::Turn(0)));
    }

    #[tokio::test]
    async fn snapshot_reports_table() {
        let (mut actor, _handle) = actor(seeded());
        actor.handle_join(10, "alice".into(), None);
        let (tx, rx) = reply();
        actor.handle_message(TableMessage::GetSnapshot { response: tx });
        let snapshot = rx.await.unwrap();
        assert_eq!(snapshot.table_id, 1);
        assert_eq!(snapshot.game.status, GameStatus::Waiting);
        assert!(snapshot.game.seats[0].player.is_some());
        assert!(!snapshot.is_closed);
    }
}
