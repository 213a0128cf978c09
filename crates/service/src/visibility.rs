use gpsflow_core::domain::actor::{Actor, Role};
use gpsflow_core::domain::request::Request;

/// Role-scoped visibility: field operators see only their own submissions;
/// the reviewing and coordinating roles see everything. Ordering of the
/// input is preserved.
pub fn visible_to(actor: &Actor, requests: Vec<Request>) -> Vec<Request> {
    match actor.role {
        Role::FieldOperator => requests
            .into_iter()
            .filter(|request| request.created_by == actor.name)
            .collect(),
        Role::RegionalHead | Role::PaymentTeam | Role::VendorCoordinator => requests,
    }
}

#[cfg(test)]
mod tests {
    use gpsflow_core::domain::actor::{Actor, Role};
    use gpsflow_core::domain::request::{NewRequest, Request, RequestType, VehicleRef};

    use super::visible_to;

    fn actor(name: &str, role: Role) -> Actor {
        Actor { id: format!("id-{name}"), name: name.to_string(), role }
    }

    fn request_by(name: &str) -> Request {
        Request::submitted(
            NewRequest {
                vehicles: vec![VehicleRef::new("KA-01-ME-1234")],
                city: "Bangalore".to_string(),
                client_name: "Amazon".to_string(),
                driver_details: Vec::new(),
                request_type: RequestType::NewTrip,
                vendor_name: None,
            },
            &actor(name, Role::FieldOperator),
        )
    }

    #[test]
    fn field_operators_are_scoped_to_their_own_submissions() {
        let requests = vec![request_by("John Operator"), request_by("Priya Operator")];

        let visible = visible_to(&actor("John Operator", Role::FieldOperator), requests);

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].created_by, "John Operator");
    }

    #[test]
    fn reviewing_roles_see_the_full_list() {
        let requests = vec![request_by("John Operator"), request_by("Priya Operator")];

        for role in [Role::RegionalHead, Role::PaymentTeam, Role::VendorCoordinator] {
            let visible = visible_to(&actor("Reviewer", role), requests.clone());
            assert_eq!(visible.len(), 2);
        }
    }
}
