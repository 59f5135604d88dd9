//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Self-update decision (spec §1's "deliberately out of scope" collaborator,
//! consumed as a pure function per `SPEC_FULL.md`): no scheduling, no
//! background daemon, just "is the candidate newer than what's installed".

use semver::Version;

/// True when `candidate` should replace `current`. A pure function by
/// design: the caller owns when to poll and what to do with the answer.
pub fn should_self_update(current: &Version, candidate: &Version) -> bool {
    candidate > current
}
