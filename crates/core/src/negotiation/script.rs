//! What the agent says back to the caller at each turn.

use rust_decimal::Decimal;

use crate::domain::load::Load;
use crate::negotiation::spoken::spoken_amount;

pub const NOT_SPECIFIED: &str = "Not specified";

pub const GREETING: &str = "Hello! Please provide your MC number to verify eligibility.";
pub const MC_NOT_HEARD: &str =
    "I didn't catch an MC number. Please say the digits of your MC number.";
pub const MC_REJECTED: &str = "I couldn't verify that MC number as an active carrier. \
     Could you repeat it, or provide another MC number?";
pub const ROUTE_NOT_UNDERSTOOD: &str =
    "Please tell me the lane you're looking for in the form: from <origin> to <destination>.";
pub const OFFER_NOT_UNDERSTOOD: &str =
    "Please give me a dollar amount for your offer, or say accept to take the posted rate.";
pub const ACCEPTED_POSTED_RATE: &str = "Great, you've accepted the posted rate. \
     I'll transfer you to a representative to finalize the booking.";
pub const TRANSFERRING: &str = "Transferring you to a representative now.";

pub fn verified(carrier_name: Option<&str>) -> String {
    let name = carrier_name.unwrap_or("your company");
    format!(
        "Thanks, I've verified {name}. What lane are you looking for? \
         Please say it as: from <origin> to <destination>."
    )
}

pub fn no_loads(origin: &str, destination: &str) -> String {
    format!(
        "Sorry, I don't have any loads from {origin} to {destination} right now. \
         Would you like to try another lane?"
    )
}

pub fn load_offer(load: &Load) -> String {
    format!(
        "I have load {id} from {origin} to {destination}. \
         Pickup {pickup}, delivery {delivery}. Equipment: {equipment}. \
         The rate is {rate} dollars. Notes: {notes}. Weight: {weight}. \
         Commodity: {commodity}. Pieces: {pieces}. Miles: {miles}. Dimensions: {dimensions}. \
         Would you like to accept this rate, or make a counter offer?",
        id = load.load_id,
        origin = load.origin,
        destination = load.destination,
        pickup = text_or_default(load.pickup_datetime.as_deref()),
        delivery = text_or_default(load.delivery_datetime.as_deref()),
        equipment = text_or_default(load.equipment_type.as_deref()),
        rate = spoken_amount(load.loadboard_rate),
        notes = text_or_default(load.notes.as_deref()),
        weight = number_or_default(load.weight),
        commodity = text_or_default(load.commodity_type.as_deref()),
        pieces = number_or_default(load.num_of_pieces),
        miles = number_or_default(load.miles),
        dimensions = text_or_default(load.dimensions.as_deref()),
    )
}

pub fn counter(offer: Decimal, rate: Decimal) -> String {
    format!(
        "I hear you at {offer}. The posted rate is {rate}. \
         Can you come closer to {rate}?",
        offer = spoken_amount(offer),
        rate = spoken_amount(rate),
    )
}

pub fn agreed(offer: Decimal) -> String {
    format!(
        "We have a deal at {}. I'll transfer you to a representative to finalize the booking.",
        spoken_amount(offer)
    )
}

pub fn round_limit_reached(offer: Decimal) -> String {
    format!(
        "I've noted your offer of {}. We've reached the limit of what I can negotiate, \
         so I'll transfer you to a representative to wrap this up.",
        spoken_amount(offer)
    )
}

pub fn text_or_default(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => NOT_SPECIFIED,
    }
}

pub fn number_or_default(value: Option<u32>) -> String {
    match value {
        Some(value) if value > 0 => value.to_string(),
        _ => NOT_SPECIFIED.to_owned(),
    }
}
