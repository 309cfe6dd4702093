use rand::distributions::Alphanumeric;
use rand::Rng;

/// A random alphanumeric id of `length` characters.
pub fn generate_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
