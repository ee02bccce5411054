//! Add-on authentication wiring that must survive a version change.

use std::fmt;

use serde::Serialize;

use crate::provider::{AddonInfo, AddonUpdateRequest, IdentityAssociation};

/// How an add-on authenticates to AWS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBinding {
    None,
    /// EKS Pod Identity associations.
    IdentityAssociations(Vec<IdentityAssociation>),
    /// IRSA service account role.
    RoleBinding { role_arn: String },
}

/// Reporting label for an [`AuthBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    None,
    PodIdentity,
    Irsa,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::PodIdentity => write!(f, "Pod Identity"),
            Self::Irsa => write!(f, "IRSA"),
        }
    }
}

impl AuthBinding {
    /// Derive the binding from provider metadata. Pod identity wins over IRSA.
    pub fn extract(addon: &AddonInfo) -> Self {
        if !addon.auth.pod_identity_associations.is_empty() {
            return Self::IdentityAssociations(addon.auth.pod_identity_associations.clone());
        }

        match addon.auth.service_account_role_arn.as_deref() {
            Some(role_arn) if !role_arn.is_empty() => Self::RoleBinding {
                role_arn: role_arn.to_string(),
            },
            _ => Self::None,
        }
    }

    pub const fn kind(&self) -> AuthKind {
        match self {
            Self::None => AuthKind::None,
            Self::IdentityAssociations(_) => AuthKind::PodIdentity,
            Self::RoleBinding { .. } => AuthKind::Irsa,
        }
    }

    /// Carry this binding into an outgoing update request.
    pub fn apply(&self, request: &mut AddonUpdateRequest) {
        match self {
            Self::None => {}
            Self::IdentityAssociations(associations) => {
                request.pod_identity_associations = Some(associations.clone());
            }
            Self::RoleBinding { role_arn } => {
                request.service_account_role_arn = Some(role_arn.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AddonAuthMetadata;

    fn addon(associations: Vec<IdentityAssociation>, role_arn: Option<&str>) -> AddonInfo {
        AddonInfo {
            name: "aws-ebs-csi-driver".to_string(),
            version: "v1.30.0-eksbuild.1".to_string(),
            auth: AddonAuthMetadata {
                pod_identity_associations: associations,
                service_account_role_arn: role_arn.map(str::to_string),
            },
        }
    }

    fn association() -> IdentityAssociation {
        IdentityAssociation {
            service_account: "ebs-csi-controller-sa".to_string(),
            role_arn: "arn:aws:iam::111122223333:role/ebs-csi".to_string(),
        }
    }

    #[test]
    fn test_extract_prefers_pod_identity() {
        let binding = AuthBinding::extract(&addon(
            vec![association()],
            Some("arn:aws:iam::111122223333:role/irsa"),
        ));
        assert_eq!(binding, AuthBinding::IdentityAssociations(vec![association()]));
        assert_eq!(binding.kind(), AuthKind::PodIdentity);
    }

    #[test]
    fn test_extract_role_binding() {
        let binding = AuthBinding::extract(&addon(
            vec![],
            Some("arn:aws:iam::111122223333:role/irsa"),
        ));
        assert_eq!(
            binding,
            AuthBinding::RoleBinding {
                role_arn: "arn:aws:iam::111122223333:role/irsa".to_string()
            }
        );
        assert_eq!(binding.kind().to_string(), "IRSA");
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(AuthBinding::extract(&addon(vec![], None)), AuthBinding::None);
        assert_eq!(
            AuthBinding::extract(&addon(vec![], Some(""))),
            AuthBinding::None
        );
    }

    #[test]
    fn test_apply_identity_associations_omits_role() {
        let binding = AuthBinding::IdentityAssociations(vec![association()]);
        let mut request =
            AddonUpdateRequest::new("dev", "aws-ebs-csi-driver", "v1.31.0-eksbuild.1");
        binding.apply(&mut request);

        assert_eq!(request.pod_identity_associations, Some(vec![association()]));
        assert!(request.service_account_role_arn.is_none());
    }

    #[test]
    fn test_apply_role_binding() {
        let binding = AuthBinding::RoleBinding {
            role_arn: "arn:aws:iam::111122223333:role/irsa".to_string(),
        };
        let mut request = AddonUpdateRequest::new("dev", "vpc-cni", "v1.18.1-eksbuild.3");
        binding.apply(&mut request);

        assert_eq!(
            request.service_account_role_arn.as_deref(),
            Some("arn:aws:iam::111122223333:role/irsa")
        );
        assert!(request.pod_identity_associations.is_none());
    }

    #[test]
    fn test_apply_none_adds_nothing() {
        let mut request = AddonUpdateRequest::new("dev", "coredns", "v1.11.3-eksbuild.2");
        let before = request.clone();
        AuthBinding::None.apply(&mut request);
        assert_eq!(request, before);
    }
}
