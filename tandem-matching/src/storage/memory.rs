use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{
    Account, AvailabilitySlot, Booking, Friendship, Interest, Meeting, NewFriendship, NewMeeting, Profile,
    SlotInput,
};

use super::{MeetingGuard, Storage};

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<i32, Account>,
    profiles: BTreeMap<i32, Profile>,
    interests: Vec<Interest>,
    user_interests: BTreeSet<(i32, i32)>,
    friendships: Vec<Friendship>,
    slots: Vec<AvailabilitySlot>,
    meetings: Vec<Meeting>,
    next_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_slots(&mut self, user_id: i32, slots: &[SlotInput]) -> Vec<AvailabilitySlot> {
        slots
            .iter()
            .map(|s| {
                let slot = AvailabilitySlot {
                    id: self.next_id(),
                    user_id,
                    day_of_week: s.day_of_week,
                    start_time: s.start_time,
                    end_time: s.end_time,
                };
                self.slots.push(slot.clone());
                slot
            })
            .collect()
    }

    fn find_or_create_interest(&mut self, name: &str) -> Interest {
        if let Some(existing) = self.interests.iter().find(|i| i.interest_name == name) {
            return existing.clone();
        }
        let interest = Interest {
            id: self.next_id(),
            interest_name: name.to_string(),
        };
        self.interests.push(interest.clone());
        interest
    }
}

/// Storage held in process memory behind a single mutex.
///
/// Every call takes the lock for its whole duration, which is what makes
/// [`Storage::create_meeting`] atomic here.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::storage("in-memory storage lock poisoned"))
    }

    pub fn insert_account(&self, account: Account) -> AppResult<()> {
        self.state()?.accounts.insert(account.id, account);
        Ok(())
    }

    pub fn insert_profile(&self, profile: Profile) -> AppResult<()> {
        self.state()?.profiles.insert(profile.id, profile);
        Ok(())
    }

    /// Account and profile in one go, for seeding.
    pub fn insert_user(&self, first_name: &str, last_name: &str, profile: Profile) -> AppResult<()> {
        self.insert_account(Account {
            id: profile.id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })?;
        self.insert_profile(profile)
    }
}

impl Storage for MemoryStorage {
    fn get_profile(&self, id: i32) -> AppResult<Option<Profile>> {
        Ok(self.state()?.profiles.get(&id).cloned())
    }

    fn get_account(&self, id: i32) -> AppResult<Option<Account>> {
        Ok(self.state()?.accounts.get(&id).cloned())
    }

    fn get_interests(&self, id: i32) -> AppResult<Vec<Interest>> {
        let state = self.state()?;
        Ok(state
            .interests
            .iter()
            .filter(|i| state.user_interests.contains(&(id, i.id)))
            .cloned()
            .collect())
    }

    fn find_profiles_by_language_swap(
        &self,
        native_language: &str,
        target_language: &str,
        exclude_id: i32,
    ) -> AppResult<Vec<Profile>> {
        Ok(self
            .state()?
            .profiles
            .values()
            .filter(|p| p.id != exclude_id)
            .filter(|p| p.native_language.as_deref() == Some(native_language))
            .filter(|p| p.target_language.as_deref() == Some(target_language))
            .cloned()
            .collect())
    }

    fn get_availability(&self, id: i32) -> AppResult<Vec<AvailabilitySlot>> {
        let mut slots: Vec<AvailabilitySlot> = self
            .state()?
            .slots
            .iter()
            .filter(|s| s.user_id == id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.day_of_week, s.start_time));
        Ok(slots)
    }

    fn is_friend(&self, a: i32, b: i32) -> AppResult<bool> {
        let pair = NewFriendship::canonical(a, b);
        Ok(self
            .state()?
            .friendships
            .iter()
            .any(|f| f.user_id_1 == pair.user_id_1 && f.user_id_2 == pair.user_id_2))
    }

    fn find_users_by_name_fragment(&self, text: &str) -> AppResult<Vec<Account>> {
        let needle = text.trim().to_lowercase();
        Ok(self
            .state()?
            .accounts
            .values()
            .filter(|a| a.full_name().to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn get_meetings_for_user(&self, id: i32) -> AppResult<Vec<Meeting>> {
        Ok(self
            .state()?
            .meetings
            .iter()
            .filter(|m| m.involves(id))
            .cloned()
            .collect())
    }

    fn create_meeting(&self, new: &NewMeeting, guard: &MeetingGuard<'_>) -> AppResult<Meeting> {
        let mut state = self.state()?;

        let bookings = state
            .meetings
            .iter()
            .filter(|m| m.involves(new.user1_id) || m.involves(new.user2_id))
            .map(|m| {
                let creator_time_zone = state
                    .profiles
                    .get(&m.user1_id)
                    .map(|p| p.home_time_zone.clone())
                    .ok_or_else(|| AppError::storage(format!("meeting {} has no creator profile", m.id)))?;
                Ok(Booking { meeting: m.clone(), creator_time_zone })
            })
            .collect::<AppResult<Vec<_>>>()?;

        guard(&bookings)?;

        let meeting = Meeting {
            id: state.next_id(),
            user1_id: new.user1_id,
            user2_id: new.user2_id,
            day_of_week: new.day_of_week,
            start_time: new.start_time,
            end_time: new.end_time,
            created_at: Utc::now(),
        };
        state.meetings.push(meeting.clone());
        Ok(meeting)
    }

    fn delete_meeting(&self, participant_id: i32, meeting_id: i32) -> AppResult<bool> {
        let mut state = self.state()?;
        let before = state.meetings.len();
        state
            .meetings
            .retain(|m| !(m.id == meeting_id && m.involves(participant_id)));
        Ok(state.meetings.len() < before)
    }

    fn add_friend(&self, a: i32, b: i32) -> AppResult<Friendship> {
        let pair = NewFriendship::canonical(a, b);
        let mut state = self.state()?;
        if state
            .friendships
            .iter()
            .any(|f| f.user_id_1 == pair.user_id_1 && f.user_id_2 == pair.user_id_2)
        {
            return Err(AppError::new(ErrorCode::FriendshipAlreadyExists, "friendship already exists"));
        }
        let friendship = Friendship {
            id: state.next_id(),
            user_id_1: pair.user_id_1,
            user_id_2: pair.user_id_2,
            created_at: Utc::now(),
        };
        state.friendships.push(friendship.clone());
        Ok(friendship)
    }

    fn list_friend_ids(&self, id: i32) -> AppResult<Vec<i32>> {
        Ok(self
            .state()?
            .friendships
            .iter()
            .filter_map(|f| match (f.user_id_1 == id, f.user_id_2 == id) {
                (true, _) => Some(f.user_id_2),
                (_, true) => Some(f.user_id_1),
                _ => None,
            })
            .collect())
    }

    fn add_availability(&self, user_id: i32, slots: &[SlotInput]) -> AppResult<Vec<AvailabilitySlot>> {
        Ok(self.state()?.insert_slots(user_id, slots))
    }

    fn replace_availability(&self, user_id: i32, slots: &[SlotInput]) -> AppResult<Vec<AvailabilitySlot>> {
        let mut state = self.state()?;
        state.slots.retain(|s| s.user_id != user_id);
        Ok(state.insert_slots(user_id, slots))
    }

    fn remove_availability(&self, user_id: i32, slot_id: i32) -> AppResult<bool> {
        let mut state = self.state()?;
        let before = state.slots.len();
        state.slots.retain(|s| !(s.id == slot_id && s.user_id == user_id));
        Ok(state.slots.len() < before)
    }

    fn list_all_interests(&self) -> AppResult<Vec<Interest>> {
        let mut all = self.state()?.interests.clone();
        all.sort_by(|a, b| a.interest_name.cmp(&b.interest_name));
        Ok(all)
    }

    fn find_or_create_interest(&self, name: &str) -> AppResult<Interest> {
        Ok(self.state()?.find_or_create_interest(name))
    }

    fn attach_interest(&self, user_id: i32, interest_id: i32) -> AppResult<()> {
        let mut state = self.state()?;
        if !state.interests.iter().any(|i| i.id == interest_id) {
            return Err(AppError::new(ErrorCode::InterestNotFound, "interest not found"));
        }
        state.user_interests.insert((user_id, interest_id));
        Ok(())
    }

    fn detach_interest(&self, user_id: i32, interest_id: i32) -> AppResult<bool> {
        Ok(self.state()?.user_interests.remove(&(user_id, interest_id)))
    }

    fn replace_interests(&self, user_id: i32, names: &[String]) -> AppResult<Vec<Interest>> {
        let mut state = self.state()?;
        state.user_interests.retain(|(owner, _)| *owner != user_id);
        let mut kept: Vec<Interest> = Vec::with_capacity(names.len());
        for name in names {
            let interest = state.find_or_create_interest(name);
            if state.user_interests.insert((user_id, interest.id)) {
                kept.push(interest);
            }
        }
        kept.sort_by_key(|i| i.id);
        Ok(kept)
    }
}
