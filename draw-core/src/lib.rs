use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use thiserror::Error;

pub type ParticipantId = usize;

/// Someone taking part in the exchange. Identity is the `id`; two participants
/// with the same name are still different people.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Participant {}

impl Hash for Participant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub giver: Participant,
    pub receiver: Participant,
}

/// The outcome of a draw: one assignment per participant, in ring order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AssignmentSet(Vec<Assignment>);

impl AssignmentSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.0.iter()
    }

    pub fn receiver_of(&self, giver: ParticipantId) -> Option<&Participant> {
        self.0
            .iter()
            .find(|a| a.giver.id == giver)
            .map(|a| &a.receiver)
    }

    /// `(giver, receiver)` id pairs in ring order.
    pub fn pairs(&self) -> Vec<(ParticipantId, ParticipantId)> {
        self.0.iter().map(|a| (a.giver.id, a.receiver.id)).collect()
    }
}

impl FromIterator<Assignment> for AssignmentSet {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AssignmentSet {
    type Item = Assignment;
    type IntoIter = std::vec::IntoIter<Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AssignmentSet {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("at least 2 participants are required for a draw, got {count}")]
    DegenerateInput { count: usize },
}

/// Draws a single gift ring over `participants`.
///
/// The participants are shuffled with Fisher–Yates (`SliceRandom::shuffle`
/// walks from the last index down, swapping each slot with a uniform pick from
/// the prefix up to and including it), then each one gives to the next in the
/// shuffled order, the last wrapping round to the first. Every ordering is
/// equally likely, so every directed Hamiltonian cycle is too.
///
/// An empty list yields an empty set. A single participant has nobody to give
/// to and is rejected with [`DrawError::DegenerateInput`].
///
/// Participant ids must be unique. Repeated ids are not detected here; a draw
/// over them can pair an id with itself, which [`check_ring`] reports.
pub fn assign<R: Rng + ?Sized>(
    participants: &[Participant],
    rng: &mut R,
) -> Result<AssignmentSet, DrawError> {
    match participants.len() {
        0 => return Ok(AssignmentSet::default()),
        1 => return Err(DrawError::DegenerateInput { count: 1 }),
        _ => {}
    }

    let mut order = participants.to_vec();
    order.shuffle(rng);

    let n = order.len();
    let assignments = (0..n)
        .map(|i| Assignment {
            giver: order[i].clone(),
            receiver: order[(i + 1) % n].clone(),
        })
        .collect();

    Ok(AssignmentSet(assignments))
}

/// [`assign`] with the thread-local generator.
pub fn draw(participants: &[Participant]) -> Result<AssignmentSet, DrawError> {
    assign(participants, &mut thread_rng())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingViolation {
    #[error("expected {expected} assignments, found {found}")]
    WrongLength { expected: usize, found: usize },
    #[error("participant {0} is assigned to themselves")]
    SelfAssignment(ParticipantId),
    #[error("participant {0} is not part of the draw")]
    UnknownParticipant(ParticipantId),
    #[error("participant {0} gives more than once")]
    DuplicateGiver(ParticipantId),
    #[error("participant {0} receives more than once")]
    DuplicateReceiver(ParticipantId),
    #[error("ring closes after {cycle_len} of {total} participants")]
    DisjointCycles { cycle_len: usize, total: usize },
}

/// Checks that `set` is one ring covering exactly `participants`.
pub fn check_ring(participants: &[Participant], set: &AssignmentSet) -> Result<(), RingViolation> {
    let total = participants.len();
    if set.len() != total {
        return Err(RingViolation::WrongLength {
            expected: total,
            found: set.len(),
        });
    }

    let known: HashSet<ParticipantId> = participants.iter().map(|p| p.id).collect();
    let mut next: HashMap<ParticipantId, ParticipantId> = HashMap::with_capacity(total);
    let mut received: HashSet<ParticipantId> = HashSet::with_capacity(total);

    for assignment in set {
        let giver = assignment.giver.id;
        let receiver = assignment.receiver.id;
        if giver == receiver {
            return Err(RingViolation::SelfAssignment(giver));
        }
        if let Some(unknown) = [giver, receiver].into_iter().find(|id| !known.contains(id)) {
            return Err(RingViolation::UnknownParticipant(unknown));
        }
        if next.insert(giver, receiver).is_some() {
            return Err(RingViolation::DuplicateGiver(giver));
        }
        if !received.insert(receiver) {
            return Err(RingViolation::DuplicateReceiver(receiver));
        }
    }

    let Some(start) = participants.first().map(|p| p.id) else {
        return Ok(());
    };

    // `next` is now a permutation of the known ids; walk it once from the start.
    let mut current = start;
    let mut cycle_len = 0;
    loop {
        current = *next
            .get(&current)
            .ok_or(RingViolation::UnknownParticipant(current))?;
        cycle_len += 1;
        if current == start || cycle_len > total {
            break;
        }
    }

    if cycle_len != total {
        return Err(RingViolation::DisjointCycles { cycle_len, total });
    }
    Ok(())
}
