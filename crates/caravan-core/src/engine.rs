//! Simulation engine - main entry point for running the simulation

use caravan_logic::clock::{GameTime, TimeClock};
use caravan_logic::events::{ActiveEvent, EventBook, LifecycleChange};
use caravan_logic::grid::{GridCell, GridLayout, GridSize, ModuleRotation, Vec3};
use caravan_logic::intel::Intel;
use caravan_logic::party::Party;
use caravan_logic::placement::PlacementError;
use caravan_logic::roads::SettlementGraph;
use caravan_logic::storage::{Item, StorageError, StorageModule, Transfer};
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::components::*;
use crate::config::SimConfig;
use crate::content::{Content, ContentError};
use crate::error::{CargoError, TradeError, TravelError};
use crate::persistence::{self, SaveData, SaveError};
use crate::systems::*;

/// An event as the UI lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    pub start_day: u32,
    pub start_hour: u32,
}

/// Everything that happened during one `advance_time` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub events: Vec<EventNotice>,
    pub arrival: Option<Arrival>,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing settlements and wagons
    pub world: World,
    /// The player's caravan
    pub party: Party,
    config: SimConfig,
    content: Content,
    graph: SettlementGraph,
    clock: TimeClock,
    /// `None` while on the road
    location: Option<String>,
    journey: Option<Journey>,
    /// Settlements in registration order; ticks visit them in this order
    settlements: Vec<Entity>,
    settlement_index: HashMap<String, Entity>,
    rng: ChaCha8Rng,
}

/// Spawns one entity per settlement definition. Duplicate names are skipped.
fn spawn_settlements(
    world: &mut World,
    content: &Content,
    rng: &mut ChaCha8Rng,
) -> (Vec<Entity>, HashMap<String, Entity>) {
    let mut order = Vec::new();
    let mut index = HashMap::new();
    for def in &content.settlements {
        if index.contains_key(&def.name) {
            log::warn!("Settlement '{}' registered twice, keeping the first", def.name);
            continue;
        }
        let entity = world.spawn((
            Settlement::from_def(def),
            Market::from_def(def, content, rng),
            EventBook::new(),
            Intel::default(),
        ));
        order.push(entity);
        index.insert(def.name.clone(), entity);
    }
    (order, index)
}

impl SimulationEngine {
    pub fn new(config: SimConfig, content: Content) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
        let mut world = World::new();
        let (settlements, settlement_index) = spawn_settlements(&mut world, &content, &mut rng);
        let graph = SettlementGraph::from_roads(&content.roads);

        let location = match &config.starting_settlement {
            Some(name) if settlement_index.contains_key(name) => Some(name.clone()),
            other => {
                if let Some(name) = other {
                    log::warn!("Unknown starting settlement '{}', using the first one", name);
                }
                content.settlements.first().map(|s| s.name.clone())
            }
        };

        log::info!(
            "Simulation ready: {} settlements, starting in {}",
            settlements.len(),
            location.as_deref().unwrap_or("nowhere")
        );

        Self {
            world,
            party: Party::new(config.starting_coins, config.starting_level),
            clock: TimeClock::new(),
            graph,
            location,
            journey: None,
            settlements,
            settlement_index,
            rng,
            config,
            content,
        }
    }

    /// Engine over the content shipped with the game.
    pub fn with_bundled_content(config: SimConfig) -> Result<Self, ContentError> {
        Ok(Self::new(config, Content::bundled()?))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn graph(&self) -> &SettlementGraph {
        &self.graph
    }

    pub fn now(&self) -> GameTime {
        self.clock.now()
    }

    /// Where the caravan is, or `None` while travelling.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn journey(&self) -> Option<&Journey> {
        self.journey.as_ref()
    }

    /// Settlement names in registration order.
    pub fn settlement_names(&self) -> Vec<String> {
        self.settlements
            .iter()
            .filter_map(|&e| self.world.get::<&Settlement>(e).ok().map(|s| s.name.clone()))
            .collect()
    }

    pub fn settlement_entity(&self, name: &str) -> Option<Entity> {
        self.settlement_index.get(name).copied()
    }

    fn settlement_position(&self, name: &str) -> Vec3 {
        self.settlement_entity(name)
            .and_then(|e| self.world.get::<&Settlement>(e).ok().map(|s| s.position))
            .unwrap_or(Vec3::ZERO)
    }

    /// Advances the simulation. This is the only way time moves.
    ///
    /// Settlements roll their events in registration order, zone-wide
    /// events roll, every settlement then ages its events and reprices, and
    /// finally the caravan moves and may arrive.
    pub fn advance_time(&mut self, hours: i64) -> TickReport {
        let Some(tick) = self.clock.advance(hours) else {
            return TickReport::default();
        };
        let days_per_year = self.config.days_per_year;

        let events = settlement_system(
            &mut self.world,
            &self.settlements,
            &self.content.zones,
            &tick,
            &self.content.events,
            days_per_year,
            &mut self.rng,
        );

        for notice in &events {
            match &notice.change {
                LifecycleChange::Started(id) => log::info!("{}: {} begins", notice.settlement, id),
                LifecycleChange::Ended(id) => log::info!("{}: {} is over", notice.settlement, id),
                LifecycleChange::Decaying(_) => {}
            }
        }

        TickReport {
            events,
            arrival: self.advance_journey(tick.now),
        }
    }

    fn advance_journey(&mut self, now: GameTime) -> Option<Arrival> {
        let journey = self.journey.as_ref()?;
        let position = journey.position(now);
        let arrived = journey.has_arrived(now);
        for (_, wagon) in self.world.query_mut::<&mut Wagon>() {
            wagon.body_position = position;
        }
        if !arrived {
            return None;
        }

        let journey = self.journey.take()?;
        let intel = self
            .settlement_index
            .get(&journey.to)
            .and_then(|&e| self.world.query_one_mut::<&mut Intel>(e).ok());
        let encounters = roll_encounters(&self.content.encounters, &mut self.party, intel, now, &mut self.rng);
        log::info!("Arrived at {} on {}", journey.to, now);
        self.location = Some(journey.to.clone());

        Some(Arrival {
            settlement: journey.to,
            at: now,
            encounters,
        })
    }

    // ---- Travel ----

    /// Sets off along the shortest road route. Returns the journey.
    pub fn travel_to(&mut self, destination: &str) -> Result<&Journey, TravelError> {
        if self.journey.is_some() {
            return Err(TravelError::AlreadyTravelling);
        }
        if !self.settlement_index.contains_key(destination) {
            return Err(TravelError::UnknownSettlement(destination.to_string()));
        }
        let from = self.location.clone().ok_or(TravelError::AlreadyTravelling)?;
        if from == destination {
            return Err(TravelError::AlreadyThere(from));
        }
        let route = self
            .graph
            .route(&from, destination)
            .ok_or_else(|| TravelError::Unreachable(destination.to_string()))?;

        let positions = (self.settlement_position(&from), self.settlement_position(destination));
        let journey = Journey::new(from, route, positions, self.now(), self.config.hours_per_road);
        log::info!(
            "Leaving {} for {}: {} road(s), {} hours",
            journey.from,
            journey.to,
            journey.roads(),
            journey.hours_remaining(self.now())
        );
        self.location = None;
        Ok(self.journey.insert(journey))
    }

    /// Road hops from where the caravan is (or last was) to `settlement`.
    pub fn distance_to(&self, settlement: &str) -> Option<u32> {
        let here = self
            .location
            .as_deref()
            .or_else(|| self.journey.as_ref().map(|j| j.from.as_str()))?;
        self.graph.distance(here, settlement)
    }

    // ---- Market ----

    /// True price right now, ignoring what the player may know.
    pub fn price_of(&self, settlement: &str, commodity: &str) -> Option<f64> {
        let entity = self.settlement_entity(settlement)?;
        let market = self.world.get::<&Market>(entity).ok()?;
        market.price_of(commodity, self.now().hour)
    }

    /// What the player sees for every commodity at `settlement`. Bands are
    /// re-drawn on every call.
    pub fn price_quotes(&mut self, settlement: &str) -> Vec<PriceQuote> {
        let Some(entity) = self.settlement_entity(settlement) else {
            return Vec::new();
        };
        let distance = self.distance_to(settlement);
        let now = self.now();
        let level = self.party.level;

        let (Ok(market), Ok(intel)) = (
            self.world.get::<&Market>(entity),
            self.world.get::<&Intel>(entity),
        ) else {
            return Vec::new();
        };
        let rng = &mut self.rng;
        market
            .prices
            .iter()
            .map(|(id, state)| PriceQuote::new(id.as_str(), quote_band(state, now, &intel, distance, level, rng)))
            .collect()
    }

    pub fn grant_price_info(&mut self, settlement: &str, hours: i64) -> bool {
        let now = self.now();
        self.with_intel(settlement, |intel| intel.prices.grant(hours, now))
    }

    pub fn grant_event_info(&mut self, settlement: &str, hours: i64) -> bool {
        let now = self.now();
        self.with_intel(settlement, |intel| intel.events.grant(hours, now))
    }

    fn with_intel(&mut self, settlement: &str, f: impl FnOnce(&mut Intel)) -> bool {
        let Some(entity) = self.settlement_entity(settlement) else {
            return false;
        };
        match self.world.query_one_mut::<&mut Intel>(entity) {
            Ok(intel) => {
                f(intel);
                true
            }
            Err(_) => false,
        }
    }

    // ---- Events ----

    /// Events the player can see at `settlement`, oldest first.
    pub fn visible_events(&self, settlement: &str) -> Vec<EventSummary> {
        let Some(entity) = self.settlement_entity(settlement) else {
            return Vec::new();
        };
        let (Ok(book), Ok(intel)) = (
            self.world.get::<&EventBook>(entity),
            self.world.get::<&Intel>(entity),
        ) else {
            return Vec::new();
        };
        book.visible(intel.events.is_active(self.now()))
            .into_iter()
            .map(|e| EventSummary {
                event_id: e.event_id.clone(),
                start_day: e.start.day,
                start_hour: e.start.hour,
            })
            .collect()
    }

    /// Every running instance, hidden or not.
    pub fn running_events(&self, settlement: &str) -> Vec<ActiveEvent> {
        self.settlement_entity(settlement)
            .and_then(|e| self.world.get::<&EventBook>(e).ok().map(|b| b.running().cloned().collect()))
            .unwrap_or_default()
    }

    pub fn reveal_event(&mut self, settlement: &str, event_id: &str) -> bool {
        let Some(entity) = self.settlement_entity(settlement) else {
            return false;
        };
        self.world
            .query_one_mut::<&mut EventBook>(entity)
            .map(|book| book.reveal(event_id))
            .unwrap_or(false)
    }

    pub fn reveal_random_event(&mut self, settlement: &str) -> Option<String> {
        let entity = self.settlement_entity(settlement)?;
        let book = self.world.query_one_mut::<&mut EventBook>(entity).ok()?;
        book.reveal_random(&mut self.rng)
    }

    /// Starts an event now, bypassing the daily roll. Returns false if the
    /// settlement or event is unknown or it is already running.
    pub fn start_event(&mut self, settlement: &str, event_id: &str) -> bool {
        if self.content.event(event_id).is_none() {
            log::warn!("Can't start unknown event '{}'", event_id);
            return false;
        }
        let Some(entity) = self.settlement_entity(settlement) else {
            return false;
        };
        let now = self.now();
        match self.world.query_one_mut::<&mut EventBook>(entity) {
            Ok(book) => book.start(event_id, now, &mut self.rng),
            Err(_) => false,
        }
    }

    // ---- Trading ----

    fn trade_price(&self, settlement: &str, commodity: &str) -> Result<f64, TradeError> {
        let entity = self
            .settlement_entity(settlement)
            .ok_or_else(|| TradeError::UnknownSettlement(settlement.to_string()))?;
        if self.location.as_deref() != Some(settlement) {
            return Err(TradeError::NotHere(settlement.to_string()));
        }
        self.world
            .get::<&Market>(entity)
            .ok()
            .and_then(|m| m.price_of(commodity, self.now().hour))
            .ok_or_else(|| TradeError::NotTraded {
                commodity: commodity.to_string(),
                settlement: settlement.to_string(),
            })
    }

    /// Buys at the true price into the pending pool. Returns the cost.
    pub fn buy(&mut self, settlement: &str, commodity: &str, count: u32) -> Result<u64, TradeError> {
        let price = self.trade_price(settlement, commodity)?;
        if count == 0 {
            return Ok(0);
        }
        let cost = (price * count as f64).round() as u64;
        if !self.party.can_afford(cost) {
            return Err(TradeError::CannotAfford {
                cost,
                coins: self.party.coins,
            });
        }
        self.party.adjust_coins(-(cost as i64));
        self.party.pending.deposit(Item::new(commodity, count));
        log::info!("Bought {} {} in {} for {}", count, commodity, settlement, cost);
        Ok(cost)
    }

    /// Sells from the pending pool at the true price. Returns the proceeds.
    pub fn sell(&mut self, settlement: &str, commodity: &str, count: u32) -> Result<u64, TradeError> {
        let price = self.trade_price(settlement, commodity)?;
        if count == 0 {
            return Ok(0);
        }
        let available = self.party.pending.count_of(commodity);
        if count > available {
            return Err(TradeError::NotEnoughGoods {
                commodity: commodity.to_string(),
                available,
                requested: count,
            });
        }
        let proceeds = (price * count as f64).round() as u64;
        self.party.pending.withdraw(commodity, count);
        self.party.adjust_coins(proceeds as i64);
        log::info!("Sold {} {} in {} for {}", count, commodity, settlement, proceeds);
        Ok(proceeds)
    }

    // ---- Wagons ----

    pub fn spawn_wagon(&mut self, name: &str) -> Entity {
        self.spawn_wagon_with_layout(name, Wagon::standard_layout())
    }

    pub fn spawn_wagon_with_layout(&mut self, name: &str, layout: GridLayout) -> Entity {
        let mut wagon = Wagon::new(name, layout);
        wagon.body_position = match (&self.location, &self.journey) {
            (_, Some(journey)) => journey.position(self.now()),
            (Some(here), None) => self.settlement_position(here),
            (None, None) => Vec3::ZERO,
        };
        self.world.spawn((wagon,))
    }

    /// All wagons in the caravan.
    pub fn wagons(&self) -> Vec<Entity> {
        self.world.query::<&Wagon>().iter().map(|(e, _)| e).collect()
    }

    fn wagon_mut(&mut self, wagon: Entity) -> Result<&mut Wagon, CargoError> {
        self.world
            .query_one_mut::<&mut Wagon>(wagon)
            .map_err(|_| CargoError::NoSuchWagon)
    }

    pub fn wagon(&self, wagon: Entity) -> Option<hecs::Ref<'_, Wagon>> {
        self.world.get::<&Wagon>(wagon).ok()
    }

    /// Ghost for the module held over `hit_point`.
    pub fn preview(
        &self,
        wagon: Entity,
        hit_point: Vec3,
        module_type: &str,
        rotation: ModuleRotation,
    ) -> Result<PlacementPreview, CargoError> {
        let module_type = self
            .content
            .module_type(module_type)
            .ok_or_else(|| PlacementError::UnknownModule(module_type.to_string()))?;
        let wagon = self.wagon(wagon).ok_or(CargoError::NoSuchWagon)?;
        Ok(wagon.preview(hit_point, module_type, rotation))
    }

    pub fn place_module(
        &mut self,
        wagon: Entity,
        module_type: &str,
        cell: GridCell,
        rotation: ModuleRotation,
    ) -> Result<GridCell, CargoError> {
        let module_type = self
            .content
            .module_type(module_type)
            .ok_or_else(|| PlacementError::UnknownModule(module_type.to_string()))?
            .clone();
        let origin = self.wagon_mut(wagon)?.place_module(&module_type, cell, rotation)?;
        log::debug!("Placed {} at {:?}", module_type.id, origin);
        Ok(origin)
    }

    pub fn remove_module(&mut self, wagon: Entity, cell: GridCell) -> Result<StorageModule, CargoError> {
        Ok(self.wagon_mut(wagon)?.remove_module(cell)?)
    }

    /// Moves goods from the pending pool into the module at `cell`.
    pub fn load_item(
        &mut self,
        wagon: Entity,
        cell: GridCell,
        commodity: &str,
        count: u32,
    ) -> Result<Transfer, CargoError> {
        let def = self
            .content
            .commodity(commodity)
            .ok_or_else(|| StorageError::UnknownCommodity(commodity.to_string()))?
            .clone();
        let available = self.party.pending.count_of(commodity);
        if count > available {
            return Err(StorageError::InsufficientQuantity {
                commodity: def.name,
                available,
                requested: count,
            }
            .into());
        }

        let module = self
            .wagon_mut(wagon)?
            .module_at_mut(cell)
            .ok_or(StorageError::NoModule)?;
        let mut source = Item::new(def.id.clone(), count);
        let transfer = module.add_item(&mut source, &def)?;
        self.party.pending.withdraw(commodity, transfer.moved);
        Ok(transfer)
    }

    /// Takes goods out of the module at `cell`. Unless destroyed they go
    /// back to the pending pool.
    pub fn unload_item(
        &mut self,
        wagon: Entity,
        cell: GridCell,
        commodity: &str,
        count: u32,
        destructive: bool,
    ) -> Result<(), CargoError> {
        let def = self
            .content
            .commodity(commodity)
            .ok_or_else(|| StorageError::UnknownCommodity(commodity.to_string()))?
            .clone();
        let module = self
            .wagon_mut(wagon)?
            .module_at_mut(cell)
            .ok_or(StorageError::NoModule)?;
        if let Some(item) = module.remove_item(&def, count, destructive)? {
            self.party.pending.deposit(item);
        }
        Ok(())
    }

    /// Stows pending goods loose in the wagon bed.
    pub fn stow_loose(
        &mut self,
        wagon: Entity,
        commodity: &str,
        count: u32,
        cell: GridCell,
        rotation: ModuleRotation,
    ) -> Result<GridCell, CargoError> {
        let footprint: GridSize = self
            .content
            .commodity(commodity)
            .ok_or_else(|| StorageError::UnknownCommodity(commodity.to_string()))?
            .footprint;
        let available = self.party.pending.count_of(commodity);
        if count == 0 || count > available {
            return Err(StorageError::InsufficientQuantity {
                commodity: commodity.to_string(),
                available,
                requested: count,
            }
            .into());
        }
        let origin = self
            .wagon_mut(wagon)?
            .stow_loose(Item::new(commodity, count), footprint, cell, rotation)?;
        self.party.pending.withdraw(commodity, count);
        Ok(origin)
    }

    /// Picks up loose goods back into the pending pool.
    pub fn take_loose(&mut self, wagon: Entity, cell: GridCell) -> Result<Item, CargoError> {
        let item = self.wagon_mut(wagon)?.take_loose(cell)?;
        self.party.pending.deposit(item.clone());
        Ok(item)
    }

    /// Units of `commodity` aboard every wagon.
    pub fn cargo_count(&self, commodity: &str) -> u32 {
        self.world
            .query::<&Wagon>()
            .iter()
            .map(|(_, w)| w.cargo_count(commodity))
            .sum()
    }

    // ---- Save/Load ----

    pub fn snapshot(&self) -> SaveData {
        SaveData {
            now: self.now(),
            party: self.party.clone(),
            location: self.location.clone(),
            journey: self.journey.clone(),
            settlements: persistence::serialize_settlements(&self.world, &self.settlements),
            wagons: persistence::serialize_wagons(&self.world),
        }
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::write_save(writer, &self.snapshot())
    }

    /// Load simulation state from a reader. Content and config stay as they
    /// are; the world is rebuilt from them and the save laid on top.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let data = persistence::read_save(reader)?;
        self.restore(data);
        Ok(())
    }

    pub fn restore(&mut self, data: SaveData) {
        let mut world = World::new();
        let (settlements, index) = spawn_settlements(&mut world, &self.content, &mut self.rng);
        persistence::restore_settlements(&mut world, &index, &self.content, data.settlements);
        for saved in data.wagons {
            world.spawn((persistence::restore_wagon(&self.content, saved),));
        }

        self.world = world;
        self.settlements = settlements;
        self.settlement_index = index;
        self.clock = TimeClock::starting_at(data.now);
        self.party = data.party;
        self.location = data.location;
        self.journey = data.journey;
        log::info!("Loaded save at {}", self.now());
    }
}
