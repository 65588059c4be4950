//! The resource table
//!
//! | path | list | create | detail read | detail write |
//! |---|---|---|---|---|
//! | /users | admin | admin | admin or self | admin or self |
//! | /categories | public | admin | public | admin |
//! | /items | public | admin | public | admin |
//! | /rentals | admin | (via /rentals/rent) | admin or renter | admin |
//! | /safe-conducts | admin | admin | admin | admin |
//! | /messages | admin or author | admin or author | admin or author | admin or author |

use crate::config::RentalConfig;
use crate::core::auth::AuthPolicy;
use crate::core::error::RegistrationError;
use crate::core::query::{SearchFilter, by_latest_update};
use crate::dispatch::{Resource, ResourcePolicy};
use crate::entities::{
    Category, CategoryPayload, Item, ItemPayload, Message, MessagePayload, Rental, RentalPayload,
    SafeConduct, SafeConductPayload, User, UserPayload,
};
use crate::server::entity_registry::EntityDescriptor;
use crate::server::host::StoreHandles;

/// Build every resource served by the dispatcher
pub fn resources(
    stores: &StoreHandles,
    config: &RentalConfig,
) -> Result<Vec<Box<dyn EntityDescriptor>>, RegistrationError> {
    let timeout = config.request_timeout();

    let users = Resource::<User, User, UserPayload>::builder("/users")
        .service(stores.users.clone())
        .search(SearchFilter::indexed::<User>())
        .policy(
            ResourcePolicy::admin_or_owner()
                .with_list(Some(AuthPolicy::AdminOnly))
                .with_create(Some(AuthPolicy::AdminOnly)),
        )
        .timeout(timeout)
        .build()?;

    let categories = Resource::<Category, Category, CategoryPayload>::builder("/categories")
        .service(stores.categories.clone())
        .search(SearchFilter::indexed::<Category>())
        .policy(ResourcePolicy::public_read_admin_write())
        .timeout(timeout)
        .build()?;

    let items = Resource::<Item, Item, ItemPayload>::builder("/items")
        .service(stores.items.clone())
        .paginate(config.pagination())
        .search(SearchFilter::indexed::<Item>())
        .policy(ResourcePolicy::public_read_admin_write())
        .countable()
        .timeout(timeout)
        .build()?;

    let rentals = Resource::<Rental, Rental, RentalPayload>::builder("/rentals")
        .service(stores.rentals.clone())
        .search(SearchFilter::indexed::<Rental>())
        .order_by(by_latest_update)
        .policy(
            ResourcePolicy::admin_only()
                .with_create(None)
                .with_retrieve(Some(AuthPolicy::AdminOrOwner)),
        )
        .countable()
        .timeout(timeout)
        .build()?;

    let safe_conducts =
        Resource::<SafeConduct, SafeConduct, SafeConductPayload>::builder("/safe-conducts")
            .service(stores.safe_conducts.clone())
            .policy(ResourcePolicy::admin_only())
            .timeout(timeout)
            .build()?;

    let messages = Resource::<Message, Message, MessagePayload>::builder("/messages")
        .service(stores.messages.clone())
        .search(SearchFilter::indexed::<Message>())
        .policy(ResourcePolicy::admin_or_owner())
        .timeout(timeout)
        .build()?;

    Ok(vec![
        Box::new(users),
        Box::new(categories),
        Box::new(items),
        Box::new(rentals),
        Box::new(safe_conducts),
        Box::new(messages),
    ])
}
