use tracing::{info, warn};

use fhiro_types::events::AccessState;

/// Identities allowed into the admin dashboard.
///
/// Matching is exact and case-sensitive. An empty policy admits nobody.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: Vec<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for admin in admins {
            let admin = admin.into();
            if !admin.is_empty() && !list.contains(&admin) {
                list.push(admin);
            }
        }
        Self { admins: list }
    }

    pub fn is_authorized(&self, email: &str) -> bool {
        self.admins.iter().any(|a| a == email)
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    pub fn admins(&self) -> &[String] {
        &self.admins
    }

    /// Access state for a settled session: signed out, or signed in as `email`.
    pub fn resolve(&self, email: Option<&str>) -> AccessState {
        match email {
            None => AccessState::Unauthenticated,
            Some(e) if self.is_authorized(e) => AccessState::Authorized,
            Some(_) => AccessState::Unauthorized,
        }
    }
}

/// Per-view access state machine.
#[derive(Debug, Clone)]
pub struct AccessMachine {
    state: AccessState,
    email: Option<String>,
}

impl Default for AccessMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessMachine {
    pub fn new() -> Self {
        Self {
            state: AccessState::Unauthenticated,
            email: None,
        }
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// A credential was presented and is being checked.
    pub fn begin(&mut self) -> AccessState {
        self.state = AccessState::Authenticating;
        self.email = None;
        self.state
    }

    /// The credential checked out as `email`.
    pub fn signed_in(&mut self, policy: &AccessPolicy, email: &str) -> AccessState {
        self.state = policy.resolve(Some(email));
        self.email = Some(email.to_string());
        match self.state {
            AccessState::Authorized => info!("{} authorized for admin dashboard", email),
            _ => warn!("{} is not authorized for admin dashboard", email),
        }
        self.state
    }

    /// The credential was rejected. The view stays signed out.
    pub fn failed(&mut self) -> AccessState {
        self.state = AccessState::Unauthenticated;
        self.email = None;
        self.state
    }

    pub fn sign_out(&mut self) -> AccessState {
        self.failed()
    }

    pub fn is_authorized(&self) -> bool {
        self.state == AccessState::Authorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::new(["connectjinish@gmail.com"])
    }

    #[test]
    fn exact_match_only() {
        let p = policy();
        assert!(p.is_authorized("connectjinish@gmail.com"));
        assert!(!p.is_authorized("Connectjinish@gmail.com"));
        assert!(!p.is_authorized("connectjinish@gmail.com "));
        assert!(!p.is_authorized("someone@else.ie"));
    }

    #[test]
    fn empty_policy_admits_nobody() {
        let p = AccessPolicy::new(Vec::<String>::new());
        assert!(p.is_empty());
        assert_eq!(p.resolve(Some("anyone@x.ie")), AccessState::Unauthorized);
    }

    #[test]
    fn duplicates_and_blanks_are_dropped() {
        let p = AccessPolicy::new(["a@x.ie", "", "a@x.ie", "b@x.ie"]);
        assert_eq!(p.admins(), ["a@x.ie", "b@x.ie"]);
    }

    #[test]
    fn machine_walks_through_states() {
        let p = policy();
        let mut m = AccessMachine::new();
        assert_eq!(m.state(), AccessState::Unauthenticated);

        assert_eq!(m.begin(), AccessState::Authenticating);
        assert_eq!(m.signed_in(&p, "intruder@x.ie"), AccessState::Unauthorized);
        assert_eq!(m.email(), Some("intruder@x.ie"));
        assert!(!m.is_authorized());

        assert_eq!(m.sign_out(), AccessState::Unauthenticated);
        assert_eq!(m.email(), None);

        m.begin();
        assert_eq!(m.signed_in(&p, "connectjinish@gmail.com"), AccessState::Authorized);
        assert!(m.is_authorized());
    }

    #[test]
    fn failed_sign_in_stays_signed_out() {
        let mut m = AccessMachine::new();
        m.begin();
        assert_eq!(m.failed(), AccessState::Unauthenticated);
    }
}
