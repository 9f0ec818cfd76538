/// External API adapters
///
/// - `covalent`: chain data provider (transactions with decoded logs)
/// - `dexscreener`: pair metadata lookup
pub mod client;
pub mod covalent;
pub mod dexscreener;
