#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    fn invalid_amount(amount: u64) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(
                ErrorCode::InvalidAmount,
                "amount must be >= 1",
                Some(format!("amount={amount}")),
            ),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_engine(err: EngineError) -> Self {
        match err {
            EngineError::InvalidAmount(amount) => Self::invalid_amount(amount),
            EngineError::SelfTransfer(address) => Self::invalid_request(
                "sender and recipient must differ",
                Some(format!("address={address}")),
            ),
            EngineError::InsufficientBalance {
                address,
                balance,
                requested,
            } => Self {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    ErrorCode::InsufficientBalance,
                    "balance is too low for this transfer",
                    Some(format!(
                        "address={address} balance={balance} requested={requested}"
                    )),
                ),
            },
            EngineError::Store(err) => {
                Self::internal("storage operation failed", Some(err.to_string()))
            }
        }
    }

    fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: ApiError::new(
                    ErrorCode::ProviderNotConfigured,
                    "provider credentials are not configured",
                    None,
                ),
            },
            ProviderError::Http(err) => Self {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::new(
                    ErrorCode::ProviderUnavailable,
                    "provider request failed",
                    Some(err.to_string()),
                ),
            },
            ProviderError::Upstream { status, body } => Self {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::new(
                    ErrorCode::ProviderUnavailable,
                    "provider rejected the request",
                    Some(format!("status={status} body={body}")),
                ),
            },
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
