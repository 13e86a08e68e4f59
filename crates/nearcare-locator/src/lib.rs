pub mod error;
pub mod gateway;
pub mod location;
pub mod normalize;
pub mod overpass;
pub mod rank;
pub mod render;
pub mod search;

pub use error::{AttemptFailure, FailureClass, GatewayError, PositionError, SearchError};
pub use gateway::{build_http_client, ProviderGateway};
pub use location::{
    FallbackReason, FixedPosition, IpGeolocation, LocationOutcome, LocationResolver,
    PositionSource, ResolvedLocation, UnsupportedPlatform,
};
pub use normalize::{normalize, normalize_record};
pub use overpass::{build_overpass_query, RawCenter, RawFacilityRecord, RawResponse};
pub use rank::rank;
pub use render::{RenderError, RenderSession, Renderer};
pub use search::{FacilitySearchService, RankedFacilityList, SearchResult, SearchSettings};

pub use tokio_util::sync::CancellationToken;
