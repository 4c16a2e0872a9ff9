//! Storage collaborator consumed by the matching and scheduling engine.
//!
//! The engine never caches records across calls; every operation reads what it needs
//! through this trait. [`PgStorage`] is the production backend, [`MemoryStorage`] backs
//! tests and local runs without a database.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use tandem_shared::errors::AppResult;

use crate::models::{
    Account, AvailabilitySlot, Booking, Friendship, Interest, Meeting, NewMeeting, Profile, SlotInput,
};

/// Accepts or rejects a new meeting given the current bookings of both participants.
pub type MeetingGuard<'a> = dyn Fn(&[Booking]) -> AppResult<()> + 'a;

pub trait Storage: Send + Sync {
    fn get_profile(&self, id: i32) -> AppResult<Option<Profile>>;

    fn get_account(&self, id: i32) -> AppResult<Option<Account>>;

    fn get_interests(&self, id: i32) -> AppResult<Vec<Interest>>;

    /// Profiles whose native and target languages are exactly the given pair, excluding
    /// `exclude_id`.
    fn find_profiles_by_language_swap(
        &self,
        native_language: &str,
        target_language: &str,
        exclude_id: i32,
    ) -> AppResult<Vec<Profile>>;

    fn get_availability(&self, id: i32) -> AppResult<Vec<AvailabilitySlot>>;

    fn is_friend(&self, a: i32, b: i32) -> AppResult<bool>;

    /// Accounts whose first, last or full name contains `text`, case-insensitively.
    fn find_users_by_name_fragment(&self, text: &str) -> AppResult<Vec<Account>>;

    fn get_meetings_for_user(&self, id: i32) -> AppResult<Vec<Meeting>>;

    /// Inserts `new` if `guard` accepts the existing bookings of both participants.
    ///
    /// Reading the bookings, running the guard and inserting happen as one atomic unit:
    /// two concurrent calls for the same participant are serialized, so the second guard
    /// sees the first meeting.
    fn create_meeting(&self, new: &NewMeeting, guard: &MeetingGuard<'_>) -> AppResult<Meeting>;

    /// Deletes a meeting the participant takes part in. Returns `false` if there is none.
    fn delete_meeting(&self, participant_id: i32, meeting_id: i32) -> AppResult<bool>;

    /// Fails with `FriendshipAlreadyExists` if the pair is already stored.
    fn add_friend(&self, a: i32, b: i32) -> AppResult<Friendship>;

    fn list_friend_ids(&self, id: i32) -> AppResult<Vec<i32>>;

    fn add_availability(&self, user_id: i32, slots: &[SlotInput]) -> AppResult<Vec<AvailabilitySlot>>;

    fn replace_availability(&self, user_id: i32, slots: &[SlotInput]) -> AppResult<Vec<AvailabilitySlot>>;

    /// Removes one of the owner's slots. Returns `false` if the owner has no such slot.
    fn remove_availability(&self, user_id: i32, slot_id: i32) -> AppResult<bool>;

    /// Every interest known to the service, ordered by name.
    fn list_all_interests(&self) -> AppResult<Vec<Interest>>;

    fn find_or_create_interest(&self, name: &str) -> AppResult<Interest>;

    /// Idempotent.
    fn attach_interest(&self, user_id: i32, interest_id: i32) -> AppResult<()>;

    fn detach_interest(&self, user_id: i32, interest_id: i32) -> AppResult<bool>;

    /// Sets the user's interests to exactly `names`, creating missing catalog entries.
    /// Atomic: either the whole set is stored or nothing changes.
    fn replace_interests(&self, user_id: i32, names: &[String]) -> AppResult<Vec<Interest>>;
}
