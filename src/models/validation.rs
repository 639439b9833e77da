use anyhow::{Result, anyhow};

pub fn validate_vrm(vrm: &str) -> Result<()> {
    if vrm.is_empty() || vrm.len() > 7 {
        return Err(anyhow!("vrm must be 7 characters or less"));
    }

    Ok(())
}

pub fn validate_mileage(mileage: Option<i64>) -> Result<u32> {
    let mileage = mileage.ok_or_else(|| anyhow!("mileage must be a positive number"))?;

    if mileage <= 0 {
        return Err(anyhow!("mileage must be a positive number"));
    }

    u32::try_from(mileage).map_err(|_| anyhow!("mileage is out of range"))
}
