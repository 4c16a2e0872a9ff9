use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Integer;

use tandem_shared::clients::db::DbPool;
use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{
    Account, AvailabilitySlot, Booking, Friendship, Interest, Meeting, NewAvailabilitySlot, NewFriendship,
    NewInterest, NewMeeting, Profile, SlotInput,
};
use crate::schema::{friendships, interests, meetings, user_accounts, user_availability, user_interests, user_profiles};

use super::{MeetingGuard, Storage};

/// First key of the advisory locks taken while booking, so they never collide with locks
/// other code takes on plain user ids.
const MEETING_LOCK_NAMESPACE: i32 = 0x7464_6d00;

type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStorage {
    pool: DbPool,
}

impl PgStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> AppResult<PgPooled> {
        self.pool.get().map_err(|e| AppError::storage(e.to_string()))
    }
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` taken literally.
fn contains_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn insert_slots(conn: &mut PgConnection, user_id: i32, slots: &[SlotInput]) -> QueryResult<Vec<AvailabilitySlot>> {
    let rows: Vec<NewAvailabilitySlot> = slots.iter().map(|s| NewAvailabilitySlot::for_user(user_id, s)).collect();
    diesel::insert_into(user_availability::table)
        .values(&rows)
        .get_results(conn)
}

fn upsert_interest(conn: &mut PgConnection, name: &str) -> QueryResult<Interest> {
    diesel::insert_into(interests::table)
        .values(&NewInterest { interest_name: name })
        .on_conflict(interests::interest_name)
        .do_nothing()
        .execute(conn)?;
    interests::table
        .filter(interests::interest_name.eq(name))
        .first::<Interest>(conn)
}

fn lock_participant(conn: &mut PgConnection, user_id: i32) -> QueryResult<()> {
    diesel::sql_query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind::<Integer, _>(MEETING_LOCK_NAMESPACE)
        .bind::<Integer, _>(user_id)
        .execute(conn)
        .map(|_| ())
}

impl Storage for PgStorage {
    fn get_profile(&self, id: i32) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        Ok(user_profiles::table.find(id).first::<Profile>(&mut conn).optional()?)
    }

    fn get_account(&self, id: i32) -> AppResult<Option<Account>> {
        let mut conn = self.conn()?;
        Ok(user_accounts::table.find(id).first::<Account>(&mut conn).optional()?)
    }

    fn get_interests(&self, id: i32) -> AppResult<Vec<Interest>> {
        let mut conn = self.conn()?;
        let rows = user_interests::table
            .inner_join(interests::table)
            .filter(user_interests::user_id.eq(id))
            .select((interests::id, interests::interest_name))
            .order(interests::id)
            .load::<Interest>(&mut conn)?;
        Ok(rows)
    }

    fn find_profiles_by_language_swap(
        &self,
        native_language: &str,
        target_language: &str,
        exclude_id: i32,
    ) -> AppResult<Vec<Profile>> {
        let mut conn = self.conn()?;
        let rows = user_profiles::table
            .filter(user_profiles::native_language.eq(native_language))
            .filter(user_profiles::target_language.eq(target_language))
            .filter(user_profiles::id.ne(exclude_id))
            .order(user_profiles::id)
            .load::<Profile>(&mut conn)?;
        Ok(rows)
    }

    fn get_availability(&self, id: i32) -> AppResult<Vec<AvailabilitySlot>> {
        let mut conn = self.conn()?;
        let mut slots = user_availability::table
            .filter(user_availability::user_id.eq(id))
            .load::<AvailabilitySlot>(&mut conn)?;
        // day_of_week is stored as text, so order in Rust to get Monday first
        slots.sort_by_key(|s| (s.day_of_week, s.start_time));
        Ok(slots)
    }

    fn is_friend(&self, a: i32, b: i32) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let pair = NewFriendship::canonical(a, b);
        let count: i64 = friendships::table
            .filter(friendships::user_id_1.eq(pair.user_id_1))
            .filter(friendships::user_id_2.eq(pair.user_id_2))
            .count()
            .get_result(&mut conn)?;
        Ok(count > 0)
    }

    fn find_users_by_name_fragment(&self, text: &str) -> AppResult<Vec<Account>> {
        let mut conn = self.conn()?;
        let rows = user_accounts::table
            .filter(
                user_accounts::first_name
                    .concat(" ")
                    .concat(user_accounts::last_name)
                    .ilike(contains_pattern(text)),
            )
            .order(user_accounts::id)
            .load::<Account>(&mut conn)?;
        Ok(rows)
    }

    fn get_meetings_for_user(&self, id: i32) -> AppResult<Vec<Meeting>> {
        let mut conn = self.conn()?;
        let rows = meetings::table
            .filter(meetings::user1_id.eq(id).or(meetings::user2_id.eq(id)))
            .order(meetings::id)
            .load::<Meeting>(&mut conn)?;
        Ok(rows)
    }

    fn create_meeting(&self, new: &NewMeeting, guard: &MeetingGuard<'_>) -> AppResult<Meeting> {
        let mut pooled = self.conn()?;
        let conn: &mut PgConnection = &mut pooled;
        let mut participants = [new.user1_id, new.user2_id];
        participants.sort_unstable();

        conn.transaction::<Meeting, AppError, _>(|conn| {
            // Ascending order so two bookings over the same pair cannot deadlock.
            for user_id in participants {
                lock_participant(conn, user_id)?;
            }

            let bookings: Vec<Booking> = meetings::table
                .inner_join(user_profiles::table)
                .filter(
                    meetings::user1_id
                        .eq_any(participants)
                        .or(meetings::user2_id.eq_any(participants)),
                )
                .select((meetings::all_columns, user_profiles::home_time_zone))
                .load::<(Meeting, String)>(conn)?
                .into_iter()
                .map(|(meeting, creator_time_zone)| Booking { meeting, creator_time_zone })
                .collect();

            guard(&bookings)?;

            let meeting = diesel::insert_into(meetings::table)
                .values(new)
                .get_result::<Meeting>(conn)?;
            Ok(meeting)
        })
    }

    fn delete_meeting(&self, participant_id: i32, meeting_id: i32) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            meetings::table
                .filter(meetings::id.eq(meeting_id))
                .filter(meetings::user1_id.eq(participant_id).or(meetings::user2_id.eq(participant_id))),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn add_friend(&self, a: i32, b: i32) -> AppResult<Friendship> {
        let mut conn = self.conn()?;
        let pair = NewFriendship::canonical(a, b);

        diesel::insert_into(friendships::table)
            .values(&pair)
            .get_result::<Friendship>(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    AppError::new(ErrorCode::FriendshipAlreadyExists, "friendship already exists")
                }
                other => other.into(),
            })
    }

    fn list_friend_ids(&self, id: i32) -> AppResult<Vec<i32>> {
        let mut conn = self.conn()?;
        let rows = friendships::table
            .filter(friendships::user_id_1.eq(id).or(friendships::user_id_2.eq(id)))
            .select((friendships::user_id_1, friendships::user_id_2))
            .order(friendships::id)
            .load::<(i32, i32)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(a, b)| if a == id { b } else { a })
            .collect())
    }

    fn add_availability(&self, user_id: i32, slots: &[SlotInput]) -> AppResult<Vec<AvailabilitySlot>> {
        let mut conn = self.conn()?;
        Ok(insert_slots(&mut conn, user_id, slots)?)
    }

    fn replace_availability(&self, user_id: i32, slots: &[SlotInput]) -> AppResult<Vec<AvailabilitySlot>> {
        let mut pooled = self.conn()?;
        let conn: &mut PgConnection = &mut pooled;
        let rows = conn.transaction::<_, DieselError, _>(|conn| {
            diesel::delete(user_availability::table.filter(user_availability::user_id.eq(user_id)))
                .execute(conn)?;
            insert_slots(conn, user_id, slots)
        })?;
        Ok(rows)
    }

    fn remove_availability(&self, user_id: i32, slot_id: i32) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            user_availability::table
                .filter(user_availability::id.eq(slot_id))
                .filter(user_availability::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn list_all_interests(&self) -> AppResult<Vec<Interest>> {
        let mut conn = self.conn()?;
        let rows = interests::table
            .order(interests::interest_name)
            .load::<Interest>(&mut conn)?;
        Ok(rows)
    }

    fn find_or_create_interest(&self, name: &str) -> AppResult<Interest> {
        let mut conn = self.conn()?;
        Ok(upsert_interest(&mut conn, name)?)
    }

    fn attach_interest(&self, user_id: i32, interest_id: i32) -> AppResult<()> {
        let mut conn = self.conn()?;
        let exists = interests::table
            .find(interest_id)
            .first::<Interest>(&mut conn)
            .optional()?
            .is_some();
        if !exists {
            return Err(AppError::new(ErrorCode::InterestNotFound, "interest not found"));
        }
        diesel::insert_into(user_interests::table)
            .values((user_interests::user_id.eq(user_id), user_interests::interest_id.eq(interest_id)))
            .on_conflict_do_nothing()
            .execute(&mut conn)?;
        Ok(())
    }

    fn detach_interest(&self, user_id: i32, interest_id: i32) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            user_interests::table
                .filter(user_interests::user_id.eq(user_id))
                .filter(user_interests::interest_id.eq(interest_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn replace_interests(&self, user_id: i32, names: &[String]) -> AppResult<Vec<Interest>> {
        let mut pooled = self.conn()?;
        let conn: &mut PgConnection = &mut pooled;
        let mut kept = conn.transaction::<_, DieselError, _>(|conn| {
            diesel::delete(user_interests::table.filter(user_interests::user_id.eq(user_id))).execute(conn)?;
            let mut kept: Vec<Interest> = Vec::with_capacity(names.len());
            for name in names {
                let interest = upsert_interest(conn, name)?;
                let attached = diesel::insert_into(user_interests::table)
                    .values((user_interests::user_id.eq(user_id), user_interests::interest_id.eq(interest.id)))
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                if attached > 0 {
                    kept.push(interest);
                }
            }
            Ok(kept)
        })?;
        kept.sort_by_key(|i| i.id);
        Ok(kept)
    }
}
