/// A fresh random correlation id for a backend call.
pub fn new_log_id() -> u32 {
    rand::random()
}
