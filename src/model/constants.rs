// Rating accumulator bounds
pub const MIN_RATING_VALUE: i32 = 0;
pub const MAX_RATING_VALUE: i32 = 12;
pub const DEFAULT_RATING: i32 = 6;
// Ladder shape
pub const LEVELS_PER_GRADE: u8 = 3;
pub const LADDER_SIZE: usize = 12;
pub const DEFAULT_LEVEL: u8 = 2;
// Inactivity sweep
pub const INACTIVITY_DAYS: i64 = 60;
pub const MAX_INACTIVITY_DAYS: i64 = 36_500;
// Vote ingestion limits
pub const VOTE_LIMIT: usize = 2;
pub const VOTE_LIMIT_WINDOW_DAYS: i64 = 60;
/// Score multipliers indexed by `[evaluator grade][rated grade]`,
/// both in `LIGHT, MEDIUM, HARD, PRO` order.
pub const RATING_COEFFICIENTS: [[f64; 4]; 4] = [
    [0.5, 0.5, 0.0, 0.0],
    [1.0, 1.0, 0.5, 0.0],
    [2.0, 2.0, 1.0, 0.5],
    [3.0, 3.0, 2.0, 1.0]
];
