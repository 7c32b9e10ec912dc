//! Screen routing and the session guard in front of it.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Assessment opened when no id is given.
pub const DEFAULT_ASSESSMENT_ID: &str = "assessment-123";

/// A screen of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Root,
    /// `/assessment/:assessment_id`
    Login { assessment_id: String },
    /// `/assessment/:assessment_id/challenges`
    ChallengeList { assessment_id: String },
    /// `/assessment/:assessment_id/challenge/:challenge_id`
    ChallengeDetail {
        assessment_id: String,
        challenge_id: String,
    },
}

impl Route {
    pub fn login(assessment_id: impl Into<String>) -> Self {
        Route::Login {
            assessment_id: assessment_id.into(),
        }
    }

    pub fn challenges(assessment_id: impl Into<String>) -> Self {
        Route::ChallengeList {
            assessment_id: assessment_id.into(),
        }
    }

    pub fn challenge(assessment_id: impl Into<String>, challenge_id: impl Into<String>) -> Self {
        Route::ChallengeDetail {
            assessment_id: assessment_id.into(),
            challenge_id: challenge_id.into(),
        }
    }

    pub fn assessment_id(&self) -> Option<&str> {
        match self {
            Route::Root => None,
            Route::Login { assessment_id }
            | Route::ChallengeList { assessment_id }
            | Route::ChallengeDetail { assessment_id, .. } => Some(assessment_id),
        }
    }

    /// Screens that need an authenticated, unexpired session.
    pub fn requires_session(&self) -> bool {
        matches!(self, Route::ChallengeList { .. } | Route::ChallengeDetail { .. })
    }

    /// The screen actually shown for `self`. `session_ok` reports whether a
    /// valid session exists for an assessment id.
    pub fn resolve(self, session_ok: impl Fn(&str) -> bool) -> Route {
        match self {
            Route::Root => Route::login(DEFAULT_ASSESSMENT_ID),
            Route::Login { assessment_id } if session_ok(&assessment_id) => {
                Route::challenges(assessment_id)
            }
            Route::ChallengeList { ref assessment_id }
            | Route::ChallengeDetail {
                ref assessment_id, ..
            } if !session_ok(assessment_id) => Route::login(assessment_id.clone()),
            route => route,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => write!(f, "/"),
            Route::Login { assessment_id } => write!(f, "/assessment/{assessment_id}"),
            Route::ChallengeList { assessment_id } => {
                write!(f, "/assessment/{assessment_id}/challenges")
            }
            Route::ChallengeDetail {
                assessment_id,
                challenge_id,
            } => write!(f, "/assessment/{assessment_id}/challenge/{challenge_id}"),
        }
    }
}

/// Unknown paths parse to [`Route::Root`].
impl FromStr for Route {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('/').filter(|p| !p.is_empty()).collect();
        let route = match segments.as_slice() {
            ["assessment", id] => Route::login(*id),
            ["assessment", id, "challenges"] => Route::challenges(*id),
            ["assessment", id, "challenge", challenge] => Route::challenge(*id, *challenge),
            _ => Route::Root,
        };
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str) -> Route {
        path.parse().unwrap()
    }

    #[test]
    fn root_redirects_to_default_login() {
        assert_eq!(
            Route::Root.resolve(|_| false),
            Route::login(DEFAULT_ASSESSMENT_ID)
        );
    }

    #[test]
    fn guarded_routes_redirect_without_session() {
        let route = parse("/assessment/assessment-123/challenge/challenge-2");
        assert_eq!(
            route.clone().resolve(|_| false),
            Route::login("assessment-123")
        );
        assert_eq!(route.clone().resolve(|id| id == "assessment-123"), route);
    }

    #[test]
    fn login_with_session_goes_to_list() {
        let route = Route::login("assessment-9");
        assert_eq!(route.clone().resolve(|_| false), route);
        assert_eq!(
            route.resolve(|id| id == "assessment-9"),
            Route::challenges("assessment-9")
        );
    }

    #[test]
    fn unknown_paths_fall_back_to_root() {
        assert_eq!(parse("/nowhere/at/all"), Route::Root);
        assert_eq!(
            parse("/nowhere").resolve(|_| true),
            Route::login(DEFAULT_ASSESSMENT_ID)
        );
    }

    #[test]
    fn parse_and_display_agree() {
        for path in [
            "/",
            "/assessment/assessment-123",
            "/assessment/assessment-123/challenges",
            "/assessment/assessment-123/challenge/challenge-1",
        ] {
            assert_eq!(parse(path).to_string(), path);
        }
    }
}
