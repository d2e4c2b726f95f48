use rand::seq::SliceRandom;
use rand::Rng;

pub const ADJECTIVES: &[&str] = &[
    "Cosmic", "Electric", "Mystic", "Neon", "Velvet", "Crimson", "Midnight", "Golden", "Silver", "Crystal", "Sonic", "Lunar", "Solar", "Astral", "Quantum", "Vibrant", "Dreamy",
    "Psychedelic", "Radiant", "Ethereal", "Glowing", "Vivid", "Surreal", "Hypnotic", "Melodic", "Groovy",
];

pub const NOUNS: &[&str] = &[
    "Phoenix", "Dragon", "Tiger", "Panther", "Wolf", "Raven", "Falcon", "Serpent", "Dolphin", "Jaguar", "Cobra", "Eagle", "Hawk", "Owl", "Horizon", "Nebula", "Galaxy", "Comet", "Star",
    "Moon", "Planet", "Ocean", "Mountain", "River", "Forest", "Desert", "Meadow", "Canyon",
];

/// Picks an `<Adjective><Noun>` display name.
pub fn generate_username<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Cosmic");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Phoenix");
    format!("{}{}", adjective, noun)
}
