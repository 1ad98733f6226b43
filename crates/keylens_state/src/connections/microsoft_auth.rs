use crate::connections::azure::AzureAction;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, MicrosoftAccount, MicrosoftAuthStatus, MicrosoftAuthStatusResponse,
    MicrosoftLoginResponse, endpoints,
};
use log::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MicrosoftAuthState {
    pub loading: bool,
    pub error: String,
    pub status: MicrosoftAuthStatus,
    pub account: Option<MicrosoftAccount>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MicrosoftAuthAction {
    LoadAuthStatus,
    LoadAuthStatusSuccess(MicrosoftAuthStatusResponse),
    LoadAuthStatusFailure(String),
    Login,
    LoginSuccess,
    LoginFailure(String),
    Logout,
    LogoutSuccess,
    LogoutFailure(String),
}

pub fn reduce(state: &mut MicrosoftAuthState, action: MicrosoftAuthAction) {
    match action {
        MicrosoftAuthAction::LoadAuthStatus | MicrosoftAuthAction::Logout => {
            state.loading = true;
            state.error.clear();
        }
        MicrosoftAuthAction::Login => {
            state.loading = true;
            state.error.clear();
            state.status = MicrosoftAuthStatus::Pending;
        }
        MicrosoftAuthAction::LoadAuthStatusSuccess(response) => {
            state.loading = false;
            state.status = response.status;
            state.account = response.account;
        }
        // Sign-in completes in the browser; the status poll reports it.
        MicrosoftAuthAction::LoginSuccess => state.loading = false,
        MicrosoftAuthAction::LogoutSuccess => {
            state.loading = false;
            state.status = MicrosoftAuthStatus::SignedOut;
            state.account = None;
        }
        MicrosoftAuthAction::LoginFailure(message) => {
            state.loading = false;
            state.status = MicrosoftAuthStatus::SignedOut;
            state.error = message;
        }
        MicrosoftAuthAction::LoadAuthStatusFailure(message)
        | MicrosoftAuthAction::LogoutFailure(message) => {
            state.loading = false;
            state.error = message;
        }
    }
}

pub async fn fetch_microsoft_auth_status(
    store: &Store,
) -> Result<MicrosoftAuthStatusResponse, ApiError> {
    store.dispatch(MicrosoftAuthAction::LoadAuthStatus);

    match store
        .fetch::<MicrosoftAuthStatusResponse>(ApiRequest::get(endpoints::MICROSOFT_AUTH_STATUS))
        .await
    {
        Ok(response) => {
            store.dispatch(MicrosoftAuthAction::LoadAuthStatusSuccess(response.clone()));
            Ok(response)
        }
        Err(e) => {
            store.dispatch(MicrosoftAuthAction::LoadAuthStatusFailure(e.message()));
            Err(e)
        }
    }
}

/// Starts the sign-in flow and returns the authorization URL to open.
pub async fn microsoft_login(store: &Store) -> Result<String, ApiError> {
    store.dispatch(MicrosoftAuthAction::Login);

    match store
        .fetch::<MicrosoftLoginResponse>(ApiRequest::get(endpoints::MICROSOFT_AUTH_LOGIN))
        .await
    {
        Ok(response) => {
            store.dispatch(MicrosoftAuthAction::LoginSuccess);
            Ok(response.url)
        }
        Err(e) => {
            store.dispatch(MicrosoftAuthAction::LoginFailure(e.message()));
            store.notify_error(&e);
            Err(e)
        }
    }
}

/// Signs out and forgets everything discovered with the account.
pub async fn microsoft_logout(store: &Store) -> Result<(), ApiError> {
    store.dispatch(MicrosoftAuthAction::Logout);

    if let Err(e) = store.send(ApiRequest::post(endpoints::MICROSOFT_AUTH_LOGOUT)).await {
        store.dispatch(MicrosoftAuthAction::LogoutFailure(e.message()));
        store.notify_error(&e);
        return Err(e);
    }

    info!("Signed out of Microsoft account");
    store.dispatch(MicrosoftAuthAction::LogoutSuccess);
    store.dispatch(AzureAction::ResetDataAzure);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_is_pending_until_status_reports() {
        let mut state = MicrosoftAuthState::default();
        reduce(&mut state, MicrosoftAuthAction::Login);
        reduce(&mut state, MicrosoftAuthAction::LoginSuccess);
        assert_eq!(state.status, MicrosoftAuthStatus::Pending);

        reduce(
            &mut state,
            MicrosoftAuthAction::LoadAuthStatusSuccess(MicrosoftAuthStatusResponse {
                status: MicrosoftAuthStatus::SignedIn,
                account: Some(MicrosoftAccount {
                    id: "1".into(),
                    username: "dev@example.com".into(),
                    name: None,
                }),
            }),
        );
        assert_eq!(state.status, MicrosoftAuthStatus::SignedIn);
        assert!(state.account.is_some());
    }

    #[test]
    fn logout_clears_account() {
        let mut state = MicrosoftAuthState {
            status: MicrosoftAuthStatus::SignedIn,
            account: Some(MicrosoftAccount {
                id: "1".into(),
                username: "dev@example.com".into(),
                name: None,
            }),
            ..Default::default()
        };
        reduce(&mut state, MicrosoftAuthAction::Logout);
        reduce(&mut state, MicrosoftAuthAction::LogoutSuccess);

        assert_eq!(state.status, MicrosoftAuthStatus::SignedOut);
        assert!(state.account.is_none());
        assert!(!state.loading);
    }
}
