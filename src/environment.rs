//! Projection of indexed Terraform resources into a CaaSP environment document.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EnvError;
use crate::terraform::{Resource, ResourceIndex};

pub const COMPUTE_INSTANCE_TYPE: &str = "openstack_compute_instance_v2";
pub const FLOATING_IP_TYPE: &str = "openstack_networking_floatingip_v2";

const MINION_STATUS: &str = "unused";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Master,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }

    /// e.g. `openstack_compute_instance_v2.master`
    pub fn compute_name(&self) -> String {
        format!("{}.{}", COMPUTE_INSTANCE_TYPE, self.as_str())
    }

    /// e.g. `openstack_networking_floatingip_v2.master_ext`
    pub fn floating_ip_name(&self) -> String {
        format!("{}.{}_ext", FLOATING_IP_TYPE, self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addresses {
    pub public_ipv4: String,
    pub private_ipv4: String,
}

impl Addresses {
    /// Without a floating IP the instance is assumed to sit on a public network,
    /// so its access address is both public and private.
    pub fn derive(
        compute: Resource<'_>,
        floating_ip: Option<Resource<'_>>,
    ) -> Result<Self, EnvError> {
        let access_ip = compute.string("access_ip_v4")?;

        let public_ipv4 = match floating_ip {
            Some(fip) => fip.string("address")?,
            None => access_ip,
        };

        Ok(Self {
            public_ipv4: public_ipv4.to_string(),
            private_ipv4: access_ip.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Minion {
    pub role: Role,
    pub minion_id: String,
    pub fqdn: String,
    pub index: String,
    pub addresses: Addresses,
    pub status: String,
}

impl Minion {
    pub fn from_compute(
        role: Role,
        index: usize,
        compute: Resource<'_>,
        floating_ip: Option<Resource<'_>>,
    ) -> Result<Self, EnvError> {
        Ok(Self {
            role,
            minion_id: compute.string("id")?.replace('-', ""),
            fqdn: compute.string("name")?.to_string(),
            index: index.to_string(),
            addresses: Addresses::derive(compute, floating_ip)?,
            status: MINION_STATUS.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub ssh_user: String,
    pub ssh_key: String,
    pub minions: Vec<Minion>,
    pub dashboard_external_host: String,
    pub dashboard_host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_external_host: Option<String>,
}

impl Environment {
    pub fn count(&self, role: Role) -> usize {
        self.minions.iter().filter(|m| m.role == role).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSettings {
    pub user: String,
    pub key: PathBuf,
}

impl SshSettings {
    pub fn new(user: impl Into<String>, key: impl Into<PathBuf>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }

    /// Relative key paths are joined onto the current directory as-is, without normalization.
    pub fn resolve(user: impl Into<String>, key: &Path) -> Result<Self, EnvError> {
        let key = std::env::current_dir()?.join(key);
        Ok(Self::new(user, key))
    }
}

/// Sort key for master/worker resources: the suffix following the role prefix.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MemberKey<'a> {
    Unindexed,
    Numbered(u64),
    Named(&'a str),
}

fn member_key<'a>(name: &'a str, prefix: &str) -> MemberKey<'a> {
    let suffix = name
        .find(prefix)
        .map(|at| &name[at + prefix.len()..])
        .unwrap_or(name);

    if suffix.is_empty() {
        return MemberKey::Unindexed;
    }

    suffix
        .strip_prefix('.')
        .and_then(|index| index.parse().ok())
        .map(MemberKey::Numbered)
        .unwrap_or(MemberKey::Named(suffix))
}

/// Compute resources of `role`, ordered unindexed first, then by numeric index.
fn members(resources: &ResourceIndex, role: Role) -> Vec<Resource<'_>> {
    let prefix = role.compute_name();
    let mut members: Vec<Resource<'_>> = resources.matching(&prefix).collect();

    members.sort_by(|a, b| {
        member_key(a.name, &prefix)
            .cmp(&member_key(b.name, &prefix))
            .then_with(|| a.name.cmp(b.name))
    });

    members
}

pub fn project(resources: &ResourceIndex, ssh: &SshSettings) -> Result<Environment, EnvError> {
    let admin_name = Role::Admin.compute_name();
    let admin_compute = resources
        .get(&admin_name)
        .ok_or(EnvError::MissingResource { name: admin_name })?;
    let admin_fip = resources.get(&Role::Admin.floating_ip_name());

    let admin = Minion::from_compute(Role::Admin, 0, admin_compute, admin_fip)?;
    tracing::debug!(
        fqdn = %admin.fqdn,
        floating_ip = admin_fip.is_some(),
        "admin node found"
    );

    let dashboard_external_host = admin.addresses.public_ipv4.clone();
    let dashboard_host = admin.addresses.private_ipv4.clone();

    let mut minions = vec![admin];
    let mut kubernetes_external_host = None;
    let mut index = 1;

    for role in [Role::Master, Role::Worker] {
        let compute_name = role.compute_name();
        let floating_ip_name = role.floating_ip_name();

        for compute in members(resources, role) {
            let floating_ip =
                resources.get(&compute.name.replace(&compute_name, &floating_ip_name));
            let minion = Minion::from_compute(role, index, compute, floating_ip)?;

            tracing::debug!(
                resource = compute.name,
                role = %role,
                index,
                floating_ip = floating_ip.is_some(),
                "node added"
            );

            if role == Role::Master && index == 1 {
                kubernetes_external_host = Some(minion.addresses.public_ipv4.clone());
            }

            minions.push(minion);
            index += 1;
        }
    }

    if kubernetes_external_host.is_none() {
        tracing::warn!("no master nodes in state, kubernetesExternalHost left unset");
    }

    Ok(Environment {
        ssh_user: ssh.user.clone(),
        ssh_key: ssh.key.display().to_string(),
        minions,
        dashboard_external_host,
        dashboard_host,
        kubernetes_external_host,
    })
}
