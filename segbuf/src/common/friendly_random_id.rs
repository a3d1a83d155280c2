// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use rand::Rng;

const ADJECTIVES: [&str; 16] = [
    "amber", "brisk", "calm", "dusty", "eager", "fuzzy", "gentle", "hollow", "icy",
    "jolly", "keen", "lucky", "misty", "noble", "quiet", "rapid",
];

const STONES: [&str; 16] = [
    "agate", "basalt", "chalk", "flint", "garnet", "granite", "jade", "jasper", "marble",
    "onyx", "opal", "pumice", "quartz", "shale", "slate", "topaz",
];

/// Short, human readable random id, eg: `misty-quartz-0421`.
#[must_use]
pub fn generate_friendly_random_id() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let stone = STONES[rng.random_range(0..STONES.len())];
    let number: u16 = rng.random_range(0..10_000);
    format!("{adjective}-{stone}-{number:04}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq2;

    #[test]
    fn test_generate_friendly_random_id() {
        let id = generate_friendly_random_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq2!(parts.len(), 3);
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(STONES.contains(&parts[1]));
        assert_eq2!(parts[2].len(), 4);
        assert!(parts[2].parse::<u16>().is_ok());
    }
}
