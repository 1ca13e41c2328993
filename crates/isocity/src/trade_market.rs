//! Day-deterministic commodities, trade partners, and import/export allocation.
//!
//! Per-commodity market factor from a cycle plus noise, per-partner pricing,
//! and largest-remainder rounding for daily import/export allocation.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

use crate::detmath::{hash_u64, pseudo_sine_wave_q16, q16_to_f64};
use crate::grid::Overlay;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommodityTier {
    Bulk,
    Consumer,
    Luxury,
}

#[derive(Debug, Clone)]
pub struct Commodity {
    pub name: String,
    pub tier: CommodityTier,
    pub base_price: f64,
    pub market_factor: f64,
}

#[derive(Debug, Clone)]
pub struct TradePartner {
    pub name: String,
    pub shipping_mult: f64,
    pub reliability: f64,
    pub favored: bool,
    pub mood: f64,
    pub disrupted: bool,
}

#[derive(Debug, Clone)]
pub struct TradeAllocation {
    pub commodity_index: usize,
    pub units: u32,
}

#[derive(Debug, Clone)]
pub struct TradeMarketSnapshot {
    pub day: u64,
    pub commodities: Vec<Commodity>,
    pub partners: Vec<TradePartner>,
    pub imports: Vec<TradeAllocation>,
    pub exports: Vec<TradeAllocation>,
}

const COMMODITY_ADJECTIVES: [&str; 8] =
    ["Northern", "Coastal", "Amber", "Iron", "Pale", "Golden", "Quiet", "Deep"];
const COMMODITY_NOUNS: [&str; 8] = ["Grain", "Steel", "Textiles", "Circuits", "Timber", "Glass", "Fuel", "Spice"];
const PARTNER_ADJECTIVES: [&str; 6] = ["Union", "Federated", "Allied", "Outer", "Inner", "Free"];
const PARTNER_NOUNS: [&str; 6] = ["Exchange", "Consortium", "Guild", "Harbor", "Syndicate", "Markets"];

const UNITS_PER_CRATE: u32 = 10;

fn day_rng(seed: u64, day: u64, salt: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_u64(seed ^ hash_u64(day).wrapping_mul(0xA24B) ^ salt))
}

fn pick_tier(rng: &mut ChaCha8Rng) -> CommodityTier {
    let r: f32 = rng.gen();
    if r < 0.45 {
        CommodityTier::Bulk
    } else if r < 0.80 {
        CommodityTier::Consumer
    } else {
        CommodityTier::Luxury
    }
}

fn build_commodities(seed: u64, day: u64, count: usize) -> Vec<Commodity> {
    let mut rng = day_rng(seed, day, 0xC0);
    (0..count)
        .map(|i| {
            let adj = COMMODITY_ADJECTIVES[(i + (seed as usize)) % COMMODITY_ADJECTIVES.len()];
            let noun = COMMODITY_NOUNS[i % COMMODITY_NOUNS.len()];
            let tier = pick_tier(&mut rng);
            let base_price = match tier {
                CommodityTier::Bulk => 5.0 + rng.gen_range(0.0..5.0),
                CommodityTier::Consumer => 15.0 + rng.gen_range(0.0..15.0),
                CommodityTier::Luxury => 50.0 + rng.gen_range(0.0..100.0),
            };
            let cycle = pseudo_sine_wave_q16(day as i64, 30 + (i as i64 * 7), i as i64);
            let noise = crate::detmath::noise_q16_from_u32(hash_u64(seed ^ day ^ i as u64) as u32);
            let market_factor = (1.0 + q16_to_f64(cycle) * 0.3 + q16_to_f64(noise) * 0.15).clamp(0.65, 1.45);
            Commodity {
                name: format!("{adj} {noun}"),
                tier,
                base_price,
                market_factor,
            }
        })
        .collect()
}

fn build_partners(seed: u64, day: u64, count: usize) -> Vec<TradePartner> {
    let mut rng = day_rng(seed, day, 0xFA);
    (0..count)
        .map(|i| {
            let adj = PARTNER_ADJECTIVES[i % PARTNER_ADJECTIVES.len()];
            let noun = PARTNER_NOUNS[(i + 1) % PARTNER_NOUNS.len()];
            let shipping_mult = 1.1 + rng.gen_range(0.0..0.35);
            let reliability = 0.72 + rng.gen_range(0.0..0.25);
            let favored = rng.gen_bool(0.2);
            let mood = 1.0 + rng.gen_range(-0.04f64..0.04);
            let disrupted = rng.gen_bool(1.0 - reliability);
            TradePartner {
                name: format!("{adj} {noun}"),
                shipping_mult,
                reliability,
                favored,
                mood,
                disrupted,
            }
        })
        .collect()
}

pub fn unit_price(commodity: &Commodity, partner: &TradePartner, import_direction: bool) -> f64 {
    let mut price = commodity.base_price * commodity.market_factor * partner.mood;
    if partner.favored {
        price *= 0.92;
    }
    if partner.disrupted {
        price *= 1.2;
    }
    if import_direction {
        price *= partner.shipping_mult;
    } else {
        price /= partner.shipping_mult;
    }
    price
}

fn industrial_supply(world: &World) -> f64 {
    world.tiles().iter().filter(|t| t.overlay == Overlay::Industrial).map(|t| t.level as f64).sum()
}

fn commercial_demand(world: &World) -> f64 {
    world.tiles().iter().filter(|t| t.overlay == Overlay::Commercial).map(|t| t.level as f64).sum()
}

/// Largest-remainder allocation of `total_units` across commodities
/// proportional to `weights`, tie-broken by a deterministic hash of index.
fn allocate_largest_remainder(total_units: u32, weights: &[f64], seed_salt: u64) -> Vec<TradeAllocation> {
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 || total_units == 0 {
        return Vec::new();
    }

    let raw: Vec<f64> = weights.iter().map(|&w| w / weight_sum * total_units as f64).collect();
    let mut floors: Vec<u32> = raw.iter().map(|&r| r.floor() as u32).collect();
    let assigned: u32 = floors.iter().sum();
    let mut remainder = total_units.saturating_sub(assigned);

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = raw[a] - raw[a].floor();
        let fb = raw[b] - raw[b].floor();
        fb.partial_cmp(&fa)
            .unwrap()
            .then_with(|| hash_u64(a as u64 ^ seed_salt).cmp(&hash_u64(b as u64 ^ seed_salt)))
    });

    for &idx in &order {
        if remainder == 0 {
            break;
        }
        floors[idx] += 1;
        remainder -= 1;
    }

    floors
        .into_iter()
        .enumerate()
        .filter(|&(_, u)| u > 0)
        .map(|(commodity_index, units)| TradeAllocation { commodity_index, units })
        .collect()
}

pub fn compute_trade_market_snapshot(world: &World, day: u64, commodity_count: usize, partner_count: usize) -> TradeMarketSnapshot {
    let seed = world.seed();
    let commodities = build_commodities(seed, day, commodity_count.min(16));
    let partners = build_partners(seed, day, partner_count);

    let supply = industrial_supply(world);
    let demand = commercial_demand(world);

    let weights: Vec<f64> = commodities
        .iter()
        .map(|c| match c.tier {
            CommodityTier::Bulk => 1.0,
            CommodityTier::Consumer => 0.7,
            CommodityTier::Luxury => 0.3,
        })
        .collect();

    let import_units = ((demand - supply).max(0.0) * UNITS_PER_CRATE as f64) as u32;
    let export_units = ((supply - demand).max(0.0) * UNITS_PER_CRATE as f64) as u32;

    let imports = allocate_largest_remainder(import_units, &weights, hash_u64(seed ^ day ^ 0x1));
    let exports = allocate_largest_remainder(export_units, &weights, hash_u64(seed ^ day ^ 0x2));

    TradeMarketSnapshot {
        day,
        commodities,
        partners,
        imports,
        exports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_sums_to_requested_total() {
        let weights = vec![1.0, 2.0, 3.0, 4.0];
        let allocation = allocate_largest_remainder(37, &weights, 0);
        let total: u32 = allocation.iter().map(|a| a.units).sum();
        assert_eq!(total, 37);
    }

    #[test]
    fn allocation_is_empty_for_zero_units() {
        let weights = vec![1.0, 1.0];
        let allocation = allocate_largest_remainder(0, &weights, 0);
        assert!(allocation.is_empty());
    }

    #[test]
    fn snapshot_is_deterministic() {
        let world = World::new(4, 4, 99);
        let a = compute_trade_market_snapshot(&world, 5, 6, 4);
        let b = compute_trade_market_snapshot(&world, 5, 6, 4);
        assert_eq!(a.commodities.len(), b.commodities.len());
        assert_eq!(a.commodities[0].name, b.commodities[0].name);
    }

    #[test]
    fn import_price_applies_shipping_multiplier_forward() {
        let commodity = Commodity {
            name: "Test".into(),
            tier: CommodityTier::Bulk,
            base_price: 10.0,
            market_factor: 1.0,
        };
        let partner = TradePartner {
            name: "P".into(),
            shipping_mult: 1.2,
            reliability: 0.9,
            favored: false,
            mood: 1.0,
            disrupted: false,
        };
        let import = unit_price(&commodity, &partner, true);
        let export = unit_price(&commodity, &partner, false);
        assert!(import > export);
    }
}
