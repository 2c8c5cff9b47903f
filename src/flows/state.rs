//! Anti-forgery `state` values for login callbacks.

// std
use std::collections::VecDeque;
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const NONCE_LEN: usize = 32;

/// How callback `state` values are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMode {
	/// One configured value shared by every login.
	#[default]
	Static,
	/// A fresh single-use nonce per login.
	PerLogin,
}

/// Issues and verifies callback `state` values.
#[derive(Debug)]
pub struct StateGuard(Inner);
#[derive(Debug)]
enum Inner {
	Fixed(String),
	PerLogin(NonceTable),
}
impl StateGuard {
	/// Default lifetime of a per-login nonce.
	pub const DEFAULT_TTL: Duration = Duration::seconds(600);
	/// Default number of outstanding per-login nonces.
	pub const DEFAULT_CAPACITY: usize = 10_000;

	/// Guard that always issues and expects `value`.
	pub fn fixed(value: impl Into<String>) -> Self {
		Self(Inner::Fixed(value.into()))
	}

	/// Guard that issues single-use nonces living for `ttl`, keeping at most `capacity`.
	pub fn per_login(ttl: Duration, capacity: usize) -> Self {
		Self(Inner::PerLogin(NonceTable {
			ttl,
			capacity: capacity.max(1),
			pending: Mutex::new(VecDeque::new()),
		}))
	}

	/// Mode this guard runs in.
	pub fn mode(&self) -> StateMode {
		match self.0 {
			Inner::Fixed(_) => StateMode::Static,
			Inner::PerLogin(_) => StateMode::PerLogin,
		}
	}

	/// Returns the state value for a new login.
	pub fn issue(&self) -> String {
		self.issue_at(OffsetDateTime::now_utc())
	}

	/// [`issue`](Self::issue) with an explicit clock.
	pub fn issue_at(&self, now: OffsetDateTime) -> String {
		match &self.0 {
			Inner::Fixed(value) => value.clone(),
			Inner::PerLogin(table) => table.issue(now),
		}
	}

	/// Accepts `received` only if it matches an outstanding value.
	pub fn verify(&self, received: &str) -> Result<()> {
		self.verify_at(received, OffsetDateTime::now_utc())
	}

	/// [`verify`](Self::verify) with an explicit clock.
	pub fn verify_at(&self, received: &str, now: OffsetDateTime) -> Result<()> {
		let accepted = match &self.0 {
			Inner::Fixed(expected) => received == expected,
			Inner::PerLogin(table) => table.consume(received, now),
		};

		if accepted { Ok(()) } else { Err(Error::StateMismatch) }
	}

	/// Number of outstanding per-login nonces, zero in static mode.
	pub fn pending(&self) -> usize {
		match &self.0 {
			Inner::Fixed(_) => 0,
			Inner::PerLogin(table) => table.pending.lock().len(),
		}
	}
}

// Entries share one TTL, so insertion order is also expiry order.
#[derive(Debug)]
struct NonceTable {
	ttl: Duration,
	capacity: usize,
	pending: Mutex<VecDeque<(String, OffsetDateTime)>>,
}
impl NonceTable {
	fn issue(&self, now: OffsetDateTime) -> String {
		let nonce = random_nonce();
		let mut pending = self.pending.lock();

		while pending.front().is_some_and(|(_, expires_at)| *expires_at <= now) {
			pending.pop_front();
		}
		while pending.len() >= self.capacity {
			pending.pop_front();
		}

		pending.push_back((nonce.clone(), now + self.ttl));

		nonce
	}

	fn consume(&self, received: &str, now: OffsetDateTime) -> bool {
		let mut pending = self.pending.lock();
		let Some(idx) = pending.iter().position(|(nonce, _)| nonce == received) else {
			return false;
		};

		pending.remove(idx).is_some_and(|(_, expires_at)| now < expires_at)
	}
}

fn random_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}
