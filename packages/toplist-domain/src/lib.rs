mod coerce;
mod derive;
mod server;

pub use coerce::coerce_number;
pub use derive::{
	BASE_ATTRIBUTES, DerivedRecord, RawGuild, RawRecord, derive, main_attribute_key,
};
pub use server::{ServerPartition, normalize_server};
