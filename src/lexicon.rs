//! Curated word pools used to randomize prompts, plus the small sampler over them.
//!
//! Pools are plain static slices. Sampling takes any `Rng` so tests can pass a
//! seeded generator while the prompt builder uses `thread_rng()`.

use rand::seq::SliceRandom;
use rand::Rng;

pub const NAMES: &[&str] = &[
  "Ava", "Noah", "Emma", "Liam", "Olivia", "Jackson", "Sophia", "Lucas", "Mia", "Aiden",
  "Isabella", "Ethan", "Riley", "Elijah", "Aria", "Grayson", "Amelia", "Mason", "Charlotte", "Logan",
  "Harper", "James", "Evelyn", "Zoe", "William", "Daniel", "Avery", "Henry", "Luna", "Owen",
  "Grace", "Leo", "Layla", "Nathan", "Aisha", "Omar", "Zara", "Hassan", "Priya", "Arjun",
  "Neha", "Rohan", "Wei", "Jing", "Ming", "Chen", "Jamal", "Imani", "Malik", "Nia",
  "Hiroshi", "Yuki", "Hana", "Kenji", "Santiago", "Mateo", "Valentina", "Camila", "Diego", "Lucia",
  "Finn", "Saoirse", "Niamh", "Conor", "Astrid", "Freya", "Lars", "Oskar", "Kavya", "Dhruv",
  "Amara", "Kwame", "Kofi", "Zola", "Pablo", "Elena", "Sakura", "Haruka", "Sora", "Amir",
  "Samira", "Yousef", "Meera", "Anika", "Tara", "Tao", "Mei-Lin", "Olga", "Ivan", "Abena",
];

pub const MATH_OBJECTS: &[&str] = &[
  "apples", "oranges", "bananas", "pencils", "markers", "crayons", "books", "notebooks", "cookies", "candies",
  "toys", "blocks", "stickers", "coins", "marbles", "flowers", "balloons", "cupcakes", "buttons", "beads",
  "shells", "seashells", "strawberries", "grapes", "muffins", "trading cards", "toy cars", "puzzles", "erasers", "rulers",
  "paint brushes", "kites", "baseballs", "jump ropes", "acorns", "leaves", "pine cones", "feathers", "rocks", "tickets",
];

pub const MATH_LOCATIONS: &[&str] = &[
  "store", "school", "park", "library", "home", "garden", "zoo", "farm", "beach", "playground",
  "museum", "bakery", "party", "classroom", "bookstore", "market", "kitchen", "backyard", "treehouse", "campsite",
  "aquarium", "pet store", "toy store", "fair", "picnic", "orchard", "pizzeria", "ice cream shop", "sports game", "field trip",
];

pub const MATH_ACTIVITIES: &[&str] = &[
  "collecting", "buying", "sharing", "giving away", "selling", "counting", "finding", "arranging", "packing", "sorting",
  "planting", "picking", "saving", "winning", "receiving", "grouping", "organizing", "gathering", "earning", "trading",
  "baking", "stacking", "building", "decorating", "delivering",
];

pub const READING_TOPICS: &[&str] = &[
  "friendship", "animals", "family", "school", "adventure", "kindness", "seasons", "nature", "community", "discovery",
  "weather", "space", "ocean", "holidays", "food", "sports", "music", "art", "plants", "dinosaurs",
  "robots", "pets", "insects", "birds", "camping", "cooking", "gardening", "mountains", "inventions", "recycling",
];

pub const READING_LOCATIONS: &[&str] = &[
  "park", "school", "beach", "library", "museum", "zoo", "farm", "store", "garden", "playground",
  "forest", "neighborhood", "classroom", "kitchen", "backyard", "treehouse", "island", "mountain", "aquarium", "campsite",
  "bakery", "greenhouse", "planetarium", "community center", "train station",
];

/// Adjectives used as seed words for antonym and synonym questions.
pub const ENGLISH_ADJECTIVES: &[&str] = &[
  "happy", "sad", "big", "small", "fast", "slow", "hot", "cold", "new", "old",
  "good", "bad", "easy", "hard", "funny", "serious", "loud", "quiet", "clean", "dirty",
  "bright", "dark", "soft", "sweet", "sour", "tall", "short", "strong", "weak", "brave",
  "kind", "smart", "silly", "friendly", "shy", "young", "smooth", "rough", "heavy", "light",
  "thick", "thin", "sharp", "wide", "narrow", "deep", "shallow", "full", "empty", "early",
  "late", "wet", "dry", "noisy", "calm", "gentle", "tiny", "huge", "messy", "neat",
];

pub const ENGLISH_NOUNS: &[&str] = &[
  "dog", "cat", "bird", "fish", "tree", "flower", "house", "car", "book", "toy",
  "ball", "game", "chair", "table", "bed", "door", "window", "teacher", "friend", "family",
  "park", "store", "zoo", "river", "bicycle", "kite", "garden", "sandwich", "backpack", "puppy",
];

pub const SCENARIOS: &[&str] = &[
  "playing at the park", "visiting the zoo", "reading in the library", "working on a science project",
  "helping in the garden", "baking cookies", "building a sandcastle", "drawing a picture",
  "writing a story", "practicing piano", "feeding the fish", "walking the dog",
  "riding a bicycle", "swimming in the pool", "making a craft", "going on a hike",
  "celebrating a birthday", "visiting grandparents", "cleaning their room", "planting flowers",
  "playing soccer", "flying a kite", "looking at stars", "doing homework",
  "taking care of a pet", "jumping rope", "playing board games", "exploring a museum",
];

pub const OBJECTS: &[&str] = &[
  "book", "ball", "pencil", "apple", "backpack", "toy", "bicycle", "computer", "sandwich", "painting",
  "puzzle", "kite", "rock", "flower", "hat", "cup", "box", "shoe", "notebook", "crayon",
  "telescope", "microscope", "map", "globe", "guitar", "drum", "camera", "ruler", "robot", "jump rope",
];

pub const LOCATIONS: &[&str] = &[
  "classroom", "playground", "home", "library", "park", "beach", "museum", "aquarium", "zoo", "garden",
  "kitchen", "cafeteria", "gymnasium", "art room", "backyard", "treehouse", "swimming pool", "farm", "forest", "science lab",
  "music room", "soccer field", "bakery", "fire station", "nature center",
];

pub const TIME_EXPRESSIONS: &[&str] = &[
  "yesterday", "last week", "this morning", "after school", "during recess", "before dinner",
  "on the weekend", "last summer", "every day", "tomorrow", "next week", "at night",
  "in the afternoon", "on Monday", "during lunch", "at sunset", "before bedtime", "in winter",
  "in spring", "during summer vacation",
];

pub const ENGLISH_TOPICS: &[&str] = &[
  "animals", "plants", "weather", "seasons", "family", "friends", "school", "sports", "hobbies", "food",
  "travel", "colors", "shapes", "vehicles", "clothes", "emotions", "celebrations", "music", "books", "nature",
  "planets", "oceans", "insects", "dinosaurs", "community helpers", "pets", "fairy tales", "science",
];

pub const MARIO_CHARACTERS: &[&str] = &[
  "Mario", "Luigi", "Princess Peach", "Princess Daisy", "Toad", "Yoshi", "Bowser", "Bowser Jr.",
  "Wario", "Waluigi", "Donkey Kong", "Diddy Kong", "Rosalina", "Toadette", "Koopa Troopa", "Goomba",
  "Shy Guy", "Boo", "Kamek", "Lakitu", "King Boo", "Dry Bones", "Birdo",
];

pub const MARIO_ITEMS: &[&str] = &[
  "Super Mushrooms", "Fire Flowers", "Stars", "Super Leaves", "Ice Flowers", "Gold Flowers",
  "Coins", "Red Coins", "Blue Coins", "1-Up Mushrooms", "Yoshi Eggs", "Green Shells",
  "Red Shells", "Question Blocks", "Brick Blocks", "Power Stars",
];

pub const MARIO_LOCATIONS: &[&str] = &[
  "Mushroom Kingdom", "Bowser's Castle", "Peach's Castle", "Luigi's Mansion", "Yoshi's Island", "Toad Town",
  "Rainbow Road", "Mario Circuit", "Delfino Plaza", "Bob-omb Battlefield", "New Donk City", "Cascade Kingdom",
  "Sand Kingdom", "World 1-1", "Ghost House", "Airship", "Koopa Troopa Beach",
];

pub const MARIO_ACTIVITIES: &[&str] = &[
  "collecting coins", "jumping on Goombas", "throwing fireballs", "riding Yoshi", "breaking blocks",
  "finding secret areas", "racing go-karts", "battling Bowser", "solving puzzles", "finding Power Stars",
  "using power-ups", "swimming underwater", "climbing vines", "entering warp pipes", "collecting 1-Ups",
];

/// Grammar error categories. The first three are the ones younger grades see.
pub const GRAMMAR_ERROR_TYPES: &[&str] = &[
  "subject-verb agreement",
  "plural forms",
  "pronoun usage",
  "verb tense",
  "article usage",
  "prepositions",
];
pub const EASY_GRAMMAR_ERROR_COUNT: usize = 3;

const MAX_DISTINCT_TRIES: usize = 32;

/// Uniform pick from a pool. An empty pool yields "".
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
  pool.choose(rng).copied().unwrap_or("")
}

/// Uniform pick that never returns `excluded`, by rejection sampling.
/// Falls back to the first non-excluded entry if the sampler keeps hitting it.
pub fn pick_excluding<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str], excluded: &str) -> &'a str {
  for _ in 0..MAX_DISTINCT_TRIES {
    let w = pick(rng, pool);
    if w != excluded {
      return w;
    }
  }
  pool.iter().copied().find(|w| *w != excluded).unwrap_or("")
}

/// Two distinct entries from the same pool (e.g. two different people).
pub fn pick_two<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> (&'a str, &'a str) {
  let first = pick(rng, pool);
  let second = pick_excluding(rng, pool, first);
  (first, second)
}

/// Random seed phrase injected into prompts for variety.
pub fn variety_seed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
  rng.gen_range(1000..=9999)
}
