use libece::{Credentials, Instance, Service, State};
use tracing::info;

use super::{authenticate, check_listing, mutated, Outcome};
use crate::client::Api;
use crate::error::{Error, Result};

const NO_SERVICES: &str = "No services information provided.";

#[derive(Debug, Clone)]
pub struct InstanceParams {
    pub state: State,
    pub name: String,
    pub services: Option<Vec<Service>>,
}

/// Makes sure the named instance exists with exactly the desired services,
/// or is gone. Services are compared by value, ignoring their order.
pub async fn reconcile(
    api: &dyn Api,
    credentials: &Credentials,
    params: &InstanceParams,
) -> Result<Outcome> {
    let token = authenticate(api, credentials).await?;

    let listing = api.list_instances(&token).await?;
    check_listing(&listing, "Something went wrong getting instance data.")?;
    let existing = Instance::find_in(&listing.body, &params.name)
        .map_err(|_| Error::Unexpected(listing.clone()))?;

    match params.state {
        State::Present => {
            let Some(services) = params.services.as_deref() else {
                return Err(Error::Validation {
                    message: NO_SERVICES,
                    response: listing,
                });
            };
            match &existing {
                Some(instance) if instance.services_match(services) => {
                    info!(name = params.name, id = instance.id, "instance is up to date");
                    let stored = serde_json::to_value(instance).map_err(libece::Error::from)?;
                    Ok(Outcome::Unchanged(stored))
                }
                Some(instance) => {
                    let response = api
                        .update_instance(&token, &instance.id, services)
                        .await?;
                    info!(
                        name = params.name,
                        id = instance.id,
                        status = response.status,
                        "instance updated"
                    );
                    mutated(response, Outcome::Updated)
                }
                None => {
                    let response = api
                        .create_instance(&token, &params.name, services)
                        .await?;
                    info!(
                        name = params.name,
                        status = response.status,
                        "instance created"
                    );
                    mutated(response, Outcome::Created)
                }
            }
        }
        State::Absent => match existing {
            Some(instance) => {
                let response = api.delete_instance(&token, &instance.id).await?;
                info!(
                    name = params.name,
                    id = instance.id,
                    status = response.status,
                    "instance deleted"
                );
                mutated(response, Outcome::Deleted)
            }
            None => Err(Error::NotFound {
                message: "No instance found by this name.",
                response: listing,
            }),
        },
    }
}
