/// Protocol dispatcher: maps each inbound request to exactly one registry or
/// router operation and encodes the outcome as a response.
use crate::protocol::{Request, ServerMessage};
use crate::registry::{ConnectionHandle, Registries};
use crate::router;

/// Dispatch one request on behalf of a connection.
///
/// The acting identity carried by the request (client_id, creator_id or
/// sender_id) is bound to the connection before the operation runs, so the
/// directory always routes through a client's most recent connection.
pub async fn dispatch(
    request: Request,
    registries: &Registries,
    conn: &ConnectionHandle,
) -> ServerMessage {
    if let Some(identity) = request.acting_identity() {
        registries.connections.bind(identity, conn).await;
    }

    match request {
        Request::StoreKeyPackage {
            client_id,
            key_package,
        } => {
            registries.key_packages.store(&client_id, key_package).await;
            ServerMessage::Ack {
                success: true,
                detail: format!("KeyPackage stored for {}", client_id),
            }
        }

        Request::FetchKeyPackage { client_id } => {
            match registries.key_packages.fetch(&client_id).await {
                Ok(key_package) => ServerMessage::KeyPackage {
                    client_id,
                    key_package,
                },
                Err(e) => ServerMessage::error(&e),
            }
        }

        Request::ListKeyPackages => ServerMessage::KeyPackageList {
            clients: registries.key_packages.list().await,
        },

        Request::CreateGroup {
            group_id,
            creator_id,
        } => match registries.groups.create(&group_id, &creator_id).await {
            Ok(members) => ServerMessage::Group { group_id, members },
            Err(e) => ServerMessage::error(&e),
        },

        Request::JoinGroup {
            group_id,
            client_id,
        } => match registries.groups.join(&group_id, &client_id).await {
            Ok(members) => ServerMessage::Group { group_id, members },
            Err(e) => ServerMessage::error(&e),
        },

        Request::RelayMessage {
            group_id,
            sender_id,
            message,
            message_type,
        } => match router::relay(registries, &group_id, &sender_id, message_type, message).await {
            Ok(receipt) => ServerMessage::Relayed {
                group_id,
                delivered: receipt.delivered,
                recipients: receipt.recipients,
            },
            Err(e) => ServerMessage::error(&e),
        },
    }
}
